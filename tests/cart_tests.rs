//! Unit tests for the cart state container and its persistence contract.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use rust_decimal::Decimal;

use storegate::cart::{
    CART_STORAGE_KEY, Cart, CartLine, CartStore, JsonFileStore, MemoryStore, clear_stored_user,
    load_stored_user, save_stored_user,
};
use storegate::models::session::{AccountType, SessionUser};

fn line(product_id: &str, size: &str, quantity: u32, unit_price: &str) -> CartLine {
    CartLine {
        product_id: product_id.to_string(),
        product_title: format!("Product {product_id}"),
        size: size.to_string(),
        quantity,
        unit_price: unit_price.parse().unwrap(),
        image_url: format!("/images/{product_id}.jpg"),
    }
}

// =============================================================================
// Merge semantics
// =============================================================================

#[test]
fn adding_same_product_and_size_merges_quantities() {
    let mut cart = Cart::with_store(MemoryStore::new());

    cart.add_line(line("1", "M", 1, "10.00"));
    cart.add_line(line("1", "M", 2, "10.00"));

    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.lines()[0].quantity, 3);
}

#[test]
fn same_product_different_sizes_stay_distinct() {
    let mut cart = Cart::with_store(MemoryStore::new());

    cart.add_line(line("1", "M", 1, "10.00"));
    cart.add_line(line("1", "L", 2, "10.00"));
    cart.add_line(line("2", "M", 1, "5.00"));

    assert_eq!(cart.lines().len(), 3);
}

// =============================================================================
// Quantity updates and removal
// =============================================================================

#[test]
fn setting_quantity_to_zero_removes_the_line() {
    let mut cart = Cart::with_store(MemoryStore::new());

    cart.add_line(line("1", "M", 2, "10.00"));
    cart.add_line(line("2", "S", 1, "4.00"));
    assert_eq!(cart.total_item_count(), 3);

    cart.set_quantity("1", "M", 0);

    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.total_item_count(), 1);
}

#[test]
fn setting_quantity_overwrites_not_adds() {
    let mut cart = Cart::with_store(MemoryStore::new());

    cart.add_line(line("1", "M", 2, "10.00"));
    cart.set_quantity("1", "M", 7);

    assert_eq!(cart.lines()[0].quantity, 7);
}

#[test]
fn setting_quantity_of_unknown_line_is_a_noop() {
    let mut cart = Cart::with_store(MemoryStore::new());

    cart.set_quantity("ghost", "M", 5);
    assert!(cart.is_empty());
}

#[test]
fn removing_absent_line_is_not_an_error() {
    let mut cart = Cart::with_store(MemoryStore::new());
    cart.add_line(line("1", "M", 1, "10.00"));

    cart.remove_line("1", "L"); // same product, other size
    assert_eq!(cart.lines().len(), 1);
}

#[test]
fn clear_empties_everything_at_once() {
    let mut cart = Cart::with_store(MemoryStore::new());
    cart.add_line(line("1", "M", 2, "10.00"));
    cart.add_line(line("2", "L", 1, "5.00"));

    cart.clear();

    assert!(cart.is_empty());
    assert_eq!(cart.total_item_count(), 0);
    assert_eq!(cart.total_price(), Decimal::ZERO);
}

// =============================================================================
// Derived totals
// =============================================================================

#[test]
fn totals_always_recompute_from_lines() {
    let mut cart = Cart::with_store(MemoryStore::new());

    cart.add_line(line("1", "M", 2, "49.90"));
    cart.add_line(line("2", "L", 1, "10.00"));
    assert_eq!(cart.total_price(), "109.80".parse::<Decimal>().unwrap());
    assert_eq!(cart.total_item_count(), 3);

    cart.set_quantity("1", "M", 1);
    assert_eq!(cart.total_price(), "59.90".parse::<Decimal>().unwrap());
    assert_eq!(cart.total_item_count(), 2);

    cart.remove_line("2", "L");
    assert_eq!(cart.total_price(), "49.90".parse::<Decimal>().unwrap());
    assert_eq!(cart.total_item_count(), 1);
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn cart_survives_reconstruction_from_file_store() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut cart = Cart::with_store(JsonFileStore::new(dir.path(), CART_STORAGE_KEY));
        cart.add_line(line("1", "M", 2, "49.90"));
        cart.add_line(line("2", "L", 1, "10.00"));
    }

    let rehydrated = Cart::with_store(JsonFileStore::new(dir.path(), CART_STORAGE_KEY));
    assert_eq!(rehydrated.lines().len(), 2);
    assert_eq!(
        rehydrated.total_price(),
        "109.80".parse::<Decimal>().unwrap()
    );
}

#[test]
fn every_mutation_writes_through() {
    let dir = tempfile::tempdir().unwrap();
    let probe = JsonFileStore::new(dir.path(), CART_STORAGE_KEY);

    let mut cart = Cart::with_store(JsonFileStore::new(dir.path(), CART_STORAGE_KEY));
    cart.add_line(line("1", "M", 2, "10.00"));
    assert_eq!(probe.load().unwrap().unwrap().len(), 1);

    cart.set_quantity("1", "M", 5);
    assert_eq!(probe.load().unwrap().unwrap()[0].quantity, 5);

    cart.clear();
    assert!(probe.load().unwrap().unwrap().is_empty());
}

#[test]
fn corrupt_cart_file_is_discarded_and_cleared() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(format!("{CART_STORAGE_KEY}.json"));
    std::fs::write(&path, "][ not json").unwrap();

    let cart = Cart::with_store(JsonFileStore::new(dir.path(), CART_STORAGE_KEY));
    assert!(cart.is_empty());
    // the corrupt payload is gone, not waiting to crash the next session
    assert!(!path.exists());
}

// =============================================================================
// Current-user mirror
// =============================================================================

#[test]
fn stored_user_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let user = SessionUser::new(AccountType::Customer, "ayse@example.com");

    save_stored_user(dir.path(), &user).unwrap();
    assert_eq!(load_stored_user(dir.path()), Some(user));

    clear_stored_user(dir.path()).unwrap();
    assert_eq!(load_stored_user(dir.path()), None);
}

#[test]
fn corrupt_stored_user_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("current-user.json");
    std::fs::write(&path, "{broken").unwrap();

    assert_eq!(load_stored_user(dir.path()), None);
    assert!(!path.exists());
}

#[test]
fn clearing_absent_stored_user_is_fine() {
    let dir = tempfile::tempdir().unwrap();
    assert!(clear_stored_user(dir.path()).is_ok());
}

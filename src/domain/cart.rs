use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// Catalog snapshot taken when a product is put in the cart. Only the fields
/// needed to render and price the line are carried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartProduct {
    pub product_id: String,
    pub name: String,
    pub unit_price: BigDecimal,
    pub image: String,
    pub origin: String,
}

/// One cart line. There is at most one line per `product_id`; repeated adds
/// merge into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub unit_price: BigDecimal,
    pub image: String,
    pub origin: String,
    pub quantity: i32,
}

impl CartLine {
    pub fn line_total(&self) -> BigDecimal {
        self.unit_price.clone() * BigDecimal::from(self.quantity)
    }
}

/// The contents of one session's cart. Lines keep insertion order, which is
/// also the display order. The total is always derived from the lines, never
/// stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Adds `quantity` of a product. An existing line for the same product
    /// absorbs the quantity; otherwise a new line is appended. Quantities
    /// below one count as one.
    pub fn add(&mut self, product: &CartProduct, quantity: i32) {
        let quantity = quantity.max(1);
        match self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product.product_id)
        {
            Some(line) => line.quantity += quantity,
            None => self.lines.push(CartLine {
                product_id: product.product_id.clone(),
                name: product.name.clone(),
                unit_price: product.unit_price.clone(),
                image: product.image.clone(),
                origin: product.origin.clone(),
                quantity,
            }),
        }
    }

    /// Sets the quantity of an existing line. Zero or negative removes the
    /// line entirely; an unknown product id is a no-op.
    pub fn set_quantity(&mut self, product_id: &str, quantity: i32) {
        if quantity <= 0 {
            self.remove(product_id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = quantity;
        }
    }

    /// Removes the line for `product_id` if present.
    pub fn remove(&mut self, product_id: &str) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities across all lines.
    pub fn item_count(&self) -> i32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum over lines of unit price times quantity, recomputed on every call.
    pub fn total(&self) -> BigDecimal {
        self.lines
            .iter()
            .fold(BigDecimal::from(0), |acc, l| acc + l.line_total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price: i32) -> CartProduct {
        CartProduct {
            product_id: id.to_string(),
            name: format!("Specimen {}", id),
            unit_price: BigDecimal::from(price),
            image: format!("https://img.test/{}.jpg", id),
            origin: "Morocco".to_string(),
        }
    }

    #[test]
    fn repeated_adds_merge_into_one_line() {
        let mut cart = Cart::default();
        cart.add(&product("a", 100), 1);
        cart.add(&product("a", 100), 2);

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 3);
    }

    #[test]
    fn total_is_sum_of_price_times_quantity() {
        let mut cart = Cart::default();
        cart.add(&product("a", 100), 2);
        cart.add(&product("b", 50), 1);

        assert_eq!(cart.total(), BigDecimal::from(250));
    }

    #[test]
    fn quantity_zero_removes_the_line() {
        let mut cart = Cart::default();
        cart.add(&product("a", 100), 2);
        cart.set_quantity("a", 0);

        assert!(cart.is_empty());
    }

    #[test]
    fn negative_quantity_also_removes_the_line() {
        let mut cart = Cart::default();
        cart.add(&product("a", 100), 2);
        cart.set_quantity("a", -3);

        assert!(cart.is_empty());
    }

    #[test]
    fn removing_an_absent_product_changes_nothing() {
        let mut cart = Cart::default();
        cart.add(&product("a", 100), 1);
        let before = cart.clone();

        cart.remove("missing");

        assert_eq!(cart, before);
    }

    #[test]
    fn set_quantity_on_absent_product_is_a_noop() {
        let mut cart = Cart::default();
        cart.set_quantity("missing", 4);

        assert!(cart.is_empty());
    }

    #[test]
    fn add_clamps_quantity_to_at_least_one() {
        let mut cart = Cart::default();
        cart.add(&product("a", 100), 0);

        assert_eq!(cart.lines[0].quantity, 1);
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn lines_keep_insertion_order() {
        let mut cart = Cart::default();
        cart.add(&product("b", 50), 1);
        cart.add(&product("a", 100), 1);
        cart.add(&product("b", 50), 1);

        let ids: Vec<&str> = cart.lines.iter().map(|l| l.product_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}

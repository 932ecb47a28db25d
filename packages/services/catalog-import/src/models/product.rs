use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Products carry at most three option dimensions.
pub const MAX_OPTIONS: usize = 3;

/// Position-stable option slots (names on a product, values on a variant).
///
/// Slot `i` always corresponds to the sheet's `Option{i+1} ...` columns, so a
/// hole in slot 1 stays a hole rather than shifting later entries left.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSlots([Option<String>; MAX_OPTIONS]);

impl OptionSlots {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, slot: usize) -> Option<&str> {
        self.0.get(slot).and_then(|v| v.as_deref())
    }

    pub fn set(&mut self, slot: usize, value: impl Into<String>) {
        if let Some(entry) = self.0.get_mut(slot) {
            *entry = Some(value.into());
        }
    }

    /// Empty `slot`, returning what it held.
    pub fn clear(&mut self, slot: usize) -> Option<String> {
        self.0.get_mut(slot).and_then(Option::take)
    }

    /// Number of slots up to and including the last filled one.
    pub fn len(&self) -> usize {
        self.0.iter().rposition(|v| v.is_some()).map(|i| i + 1).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// All three slots, unfilled ones as `None`.
    pub fn tuple(&self) -> [Option<&str>; MAX_OPTIONS] {
        [self.get(0), self.get(1), self.get(2)]
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> {
        self.0[..self.len()].iter().map(|v| v.as_deref())
    }
}

impl<S: Into<String>> FromIterator<Option<S>> for OptionSlots {
    fn from_iter<I: IntoIterator<Item = Option<S>>>(iter: I) -> Self {
        let mut slots = OptionSlots::default();
        for (i, v) in iter.into_iter().take(MAX_OPTIONS).enumerate() {
            if let Some(v) = v {
                slots.set(i, v);
            }
        }
        slots
    }
}

impl Serialize for OptionSlots {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for v in self.iter() {
            seq.serialize_element(&v)?;
        }
        seq.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeightUnit {
    Grams,
    Kilograms,
    Pounds,
    Ounces,
}

impl WeightUnit {
    /// Sheet abbreviation (`g`, `kg`, `lb`, `oz`) to unit.
    pub fn from_cell(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "g" => Some(WeightUnit::Grams),
            "kg" => Some(WeightUnit::Kilograms),
            "lb" => Some(WeightUnit::Pounds),
            "oz" => Some(WeightUnit::Ounces),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryPolicy {
    Continue,
    Deny,
}

impl InventoryPolicy {
    pub fn from_cell(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "continue" => Some(InventoryPolicy::Continue),
            "deny" => Some(InventoryPolicy::Deny),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLevelInput {
    pub available_quantity: i64,
    pub location_id: String,
}

/// Product image: either a new upload by URL or an existing remote image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ImageInput {
    Src { src: String },
    Existing { id: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInput {
    pub id: Option<String>,
    pub options: OptionSlots,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub taxable: Option<bool>,
    pub tax_code: Option<String>,
    pub price: Option<f64>,
    pub compare_at_price: Option<f64>,
    pub weight_unit: Option<WeightUnit>,
    pub inventory_policy: Option<InventoryPolicy>,
    pub inventory_quantities: Vec<InventoryLevelInput>,
    pub requires_shipping: Option<bool>,
    pub image_src: Option<String>,
    pub image_id: Option<String>,
}

/// One product as assembled from the sheet, shaped like the Admin API's
/// `ProductInput`. Unset fields serialize as `null` and are stripped by
/// [`crate::clients::clean_input`] before sending.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub id: Option<String>,
    pub handle: String,
    pub title: Option<String>,
    pub vendor: Option<String>,
    pub tags: Option<String>,
    pub product_type: Option<String>,
    pub description_html: Option<String>,
    pub published: Option<bool>,
    pub options: OptionSlots,
    pub images: Vec<ImageInput>,
    pub variants: Vec<VariantInput>,
    pub collections_to_join: Vec<String>,
}

impl ProductInput {
    pub fn new(handle: impl Into<String>) -> Self {
        Self { handle: handle.into(), ..Default::default() }
    }
}

/// Handle-keyed products in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ProductMap {
    products: Vec<ProductInput>,
    index: HashMap<String, usize>,
}

impl ProductMap {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.products.len() }

    pub fn is_empty(&self) -> bool { self.products.is_empty() }

    pub fn contains(&self, handle: &str) -> bool { self.index.contains_key(handle) }

    pub fn get(&self, handle: &str) -> Option<&ProductInput> {
        self.index.get(handle).map(|&i| &self.products[i])
    }

    pub fn get_mut(&mut self, handle: &str) -> Option<&mut ProductInput> {
        match self.index.get(handle) {
            Some(&i) => self.products.get_mut(i),
            None => None,
        }
    }

    /// Existing product for `handle`, or the one produced by `create`, appended last.
    pub fn get_or_insert_with(&mut self, handle: &str, create: impl FnOnce() -> ProductInput) -> &mut ProductInput {
        let i = match self.index.get(handle) {
            Some(&i) => i,
            None => {
                self.products.push(create());
                self.index.insert(handle.to_string(), self.products.len() - 1);
                self.products.len() - 1
            }
        };
        &mut self.products[i]
    }

    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.products.iter().map(|p| p.handle.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProductInput> { self.products.iter() }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, ProductInput> { self.products.iter_mut() }

    pub fn into_vec(self) -> Vec<ProductInput> { self.products }
}

impl IntoIterator for ProductMap {
    type Item = ProductInput;
    type IntoIter = std::vec::IntoIter<ProductInput>;

    fn into_iter(self) -> Self::IntoIter { self.products.into_iter() }
}

impl<'a> IntoIterator for &'a ProductMap {
    type Item = &'a ProductInput;
    type IntoIter = std::slice::Iter<'a, ProductInput>;

    fn into_iter(self) -> Self::IntoIter { self.products.iter() }
}

use crate::handlers::Row;
use crate::ids::{GlobalIdResource, IdTranslator, ResourceId};
use crate::models::*;

/// Column headers of the product import sheet.
pub mod columns {
    pub const HANDLE: &str = "Handle";
    pub const TITLE: &str = "Title";
    pub const BODY_HTML: &str = "Body (HTML)";
    pub const VENDOR: &str = "Vendor";
    pub const PRODUCT_TYPE: &str = "Type";
    pub const TAGS: &str = "Tags";
    pub const PUBLISHED: &str = "Published";
    pub const VARIANT_SKU: &str = "Variant SKU";
    pub const VARIANT_INVENTORY_QTY: &str = "Variant Inventory Qty";
    pub const VARIANT_INVENTORY_POLICY: &str = "Variant Inventory Policy";
    pub const VARIANT_PRICE: &str = "Variant Price";
    pub const VARIANT_COMPARE_AT_PRICE: &str = "Variant Compare At Price";
    pub const VARIANT_REQUIRES_SHIPPING: &str = "Variant Requires Shipping";
    pub const VARIANT_TAXABLE: &str = "Variant Taxable";
    pub const VARIANT_BARCODE: &str = "Variant Barcode";
    pub const VARIANT_TAX_CODE: &str = "Variant Tax Code";
    pub const VARIANT_WEIGHT_UNIT: &str = "Variant Weight Unit";
    pub const VARIANT_IMAGE: &str = "Variant Image";
    pub const IMAGE_SRC: &str = "Image Src";

    pub fn option_name(slot: usize) -> String { format!("Option{} Name", slot + 1) }

    pub fn option_value(slot: usize) -> String { format!("Option{} Value", slot + 1) }
}

/// Folds sheet rows into handle-keyed products.
///
/// Rows sharing a handle contribute to one product: each non image-only row
/// adds a variant, each `Image Src` adds an image, and scalar product fields
/// keep the first non-empty value seen.
#[derive(Debug, Clone, Default)]
pub struct ProductMapper {
    ids: IdTranslator,
}

impl ProductMapper {
    pub fn new(ids: IdTranslator) -> Self { Self { ids } }

    pub fn build<I>(
        &self,
        rows: I,
        location_id: Option<&ResourceId>,
        collection_id: Option<&ResourceId>,
    ) -> Result<ProductMap>
    where
        I: IntoIterator<Item = Row>,
    {
        let location = match location_id {
            Some(raw) => Some(
                self.ids
                    .to_global_id(raw, GlobalIdResource::Location)
                    .ok_or_else(|| ImportError::Validation("Invalid location_id".to_string()))?,
            ),
            None => None,
        };
        let collection = match collection_id {
            Some(raw) => Some(
                self.ids
                    .to_global_id(raw, GlobalIdResource::Collection)
                    .ok_or_else(|| ImportError::Validation("Invalid collection_id".to_string()))?,
            ),
            None => None,
        };

        let mut products = ProductMap::new();
        let mut row_count = 0usize;
        for row in rows {
            // header
            if row.number() == 1 {
                continue;
            }
            let Some(handle) = row.string(columns::HANDLE) else { continue };
            row_count += 1;
            self.apply_row(&mut products, &row, &handle, location.as_deref(), collection.as_deref())?;
        }
        drop_unnamed_values(&mut products);

        tracing::info!(
            rows = row_count,
            products = products.len(),
            location = ?location,
            collection = ?collection,
            "Mapped sheet rows to products"
        );
        Ok(products)
    }

    fn apply_row(
        &self,
        products: &mut ProductMap,
        row: &Row,
        handle: &str,
        location: Option<&str>,
        collection: Option<&str>,
    ) -> Result<()> {
        // A blank first option value marks an extra-image row.
        let image_only = row.string(&columns::option_value(0)).is_none();

        let product = products.get_or_insert_with(handle, || {
            let mut p = ProductInput::new(handle);
            if let Some(c) = collection {
                p.collections_to_join = vec![c.to_string()];
            }
            p
        });

        let mut values = OptionSlots::new();
        for slot in 0..MAX_OPTIONS {
            if let Some(name) = row.string(&columns::option_name(slot)) {
                if let Some(existing) = product.options.get(slot) {
                    if existing != name {
                        return Err(ImportError::Validation(format!(
                            "Multiple \"Option{} Name\" (\"{}\", \"{}\") in \"{}\"",
                            slot + 1,
                            existing,
                            name,
                            handle
                        )));
                    }
                }
                product.options.set(slot, name);
            }
            if let Some(value) = row.string(&columns::option_value(slot)) {
                values.set(slot, value);
            }
        }

        if !image_only {
            let mut variant = map_variant(row, location);
            variant.options = values;
            product.variants.push(variant);
        }

        if let Some(src) = row.string(columns::IMAGE_SRC) {
            product.images.push(ImageInput::Src { src });
        }

        keep_first(&mut product.title, row.string(columns::TITLE));
        keep_first(&mut product.vendor, row.string(columns::VENDOR));
        keep_first(&mut product.tags, row.string(columns::TAGS));
        keep_first(&mut product.description_html, row.string(columns::BODY_HTML));
        keep_first(&mut product.product_type, row.string(columns::PRODUCT_TYPE));
        keep_first(&mut product.published, row.boolean(columns::PUBLISHED));

        Ok(())
    }
}

/// A variant never carries more option values than its product has names.
fn drop_unnamed_values(products: &mut ProductMap) {
    for product in products.iter_mut() {
        let unnamed: Vec<usize> = (0..MAX_OPTIONS).filter(|slot| product.options.get(*slot).is_none()).collect();
        for variant in product.variants.iter_mut() {
            for &slot in &unnamed {
                if let Some(value) = variant.options.clear(slot) {
                    tracing::warn!(
                        handle = %product.handle,
                        option = slot + 1,
                        value = %value,
                        "Dropped option value without an option name"
                    );
                }
            }
        }
    }
}

fn map_variant(row: &Row, location: Option<&str>) -> VariantInput {
    let inventory_quantities = match location {
        // quantities can only be set against a location
        Some(location_id) => vec![InventoryLevelInput {
            available_quantity: row.number_value(columns::VARIANT_INVENTORY_QTY).map(f64::round).unwrap_or(0.0) as i64,
            location_id: location_id.to_string(),
        }],
        None => Vec::new(),
    };

    VariantInput {
        sku: row.string(columns::VARIANT_SKU),
        taxable: row.boolean(columns::VARIANT_TAXABLE),
        barcode: row.string(columns::VARIANT_BARCODE),
        tax_code: row.string(columns::VARIANT_TAX_CODE),
        price: row.number_value(columns::VARIANT_PRICE),
        compare_at_price: row.number_value(columns::VARIANT_COMPARE_AT_PRICE),
        image_src: row.string(columns::VARIANT_IMAGE),
        weight_unit: row.string(columns::VARIANT_WEIGHT_UNIT).and_then(|v| WeightUnit::from_cell(&v)),
        inventory_policy: row
            .string(columns::VARIANT_INVENTORY_POLICY)
            .and_then(|v| InventoryPolicy::from_cell(&v)),
        requires_shipping: row.boolean(columns::VARIANT_REQUIRES_SHIPPING),
        inventory_quantities,
        ..Default::default()
    }
}

fn keep_first<T>(slot: &mut Option<T>, candidate: Option<T>) {
    if slot.is_none() {
        *slot = candidate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{CellValue, Worksheet};

    const HEADER: [&str; 9] = [
        "Handle", "Title", "Option1 Name", "Option1 Value", "Option2 Name", "Option2 Value",
        "Variant Price", "Image Src", "Variant Inventory Qty",
    ];

    fn sheet(rows: &[[&str; 9]]) -> Worksheet {
        let mut grid = vec![HEADER.iter().map(|h| CellValue::Text(h.to_string())).collect::<Vec<_>>()];
        for r in rows {
            grid.push(
                r.iter()
                    .map(|v| if v.is_empty() { CellValue::Empty } else { CellValue::Text(v.to_string()) })
                    .collect(),
            );
        }
        Worksheet::from_grid(grid, true)
    }

    fn mapper() -> ProductMapper { ProductMapper::new(IdTranslator::new("platform")) }

    #[test]
    fn groups_rows_by_handle_in_first_seen_order() {
        let ws = sheet(&[
            ["a", "Shirt", "Color", "Red", "", "", "10", "", ""],
            ["a", "", "Color", "Blue", "", "", "11", "", ""],
            ["b", "Hat", "Size", "M", "", "", "5", "", ""],
        ]);
        let products = mapper().build(ws, None, None).unwrap();
        assert_eq!(products.handles().collect::<Vec<_>>(), vec!["a", "b"]);

        let a = products.get("a").unwrap();
        assert_eq!(a.variants.len(), 2);
        assert_eq!(a.options.get(0), Some("Color"));
        assert_eq!(a.variants[1].options.get(0), Some("Blue"));
        assert_eq!(a.variants[1].price, Some(11.0));
        assert_eq!(a.title.as_deref(), Some("Shirt"));

        let b = products.get("b").unwrap();
        assert_eq!(b.variants.len(), 1);
        assert_eq!(b.options.get(0), Some("Size"));
    }

    #[test]
    fn conflicting_option_name_is_rejected() {
        let ws = sheet(&[
            ["a", "", "Color", "Red", "", "", "", "", ""],
            ["a", "", "Colour", "Blue", "", "", "", "", ""],
        ]);
        let err = mapper().build(ws, None, None).unwrap_err();
        assert_eq!(err.to_string(), r#"Multiple "Option1 Name" ("Color", "Colour") in "a""#);
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn image_rows_add_images_without_variants() {
        let ws = sheet(&[
            ["a", "Shirt", "Color", "Red", "", "", "10", "https://cdn/1.png", ""],
            ["a", "", "", "", "", "", "", "https://cdn/2.png", ""],
            ["c", "Poster", "", "", "", "", "", "https://cdn/3.png", ""],
        ]);
        let products = mapper().build(ws, None, None).unwrap();
        let a = products.get("a").unwrap();
        assert_eq!(a.variants.len(), 1);
        assert_eq!(a.images.len(), 2);
        let c = products.get("c").unwrap();
        assert!(c.variants.is_empty());
        assert_eq!(c.images, vec![ImageInput::Src { src: "https://cdn/3.png".into() }]);
    }

    #[test]
    fn blank_handles_and_header_are_skipped() {
        let ws = sheet(&[
            ["", "Orphan", "Color", "Red", "", "", "", "", ""],
            ["a", "Shirt", "Color", "Red", "", "", "", "", ""],
        ]);
        let products = mapper().build(ws, None, None).unwrap();
        assert_eq!(products.len(), 1);
        assert!(!products.contains("Handle"));
    }

    #[test]
    fn location_attaches_inventory_with_zero_default() {
        let ws = sheet(&[
            ["a", "", "Color", "Red", "", "", "", "", "7"],
            ["a", "", "Color", "Blue", "", "", "", "", ""],
        ]);
        let products = mapper().build(ws, Some(&ResourceId::Int(42)), Some(&"gid://platform/Collection/9".into())).unwrap();
        let a = products.get("a").unwrap();
        assert_eq!(a.variants[0].inventory_quantities[0].available_quantity, 7);
        assert_eq!(a.variants[1].inventory_quantities[0].available_quantity, 0);
        assert_eq!(a.variants[1].inventory_quantities[0].location_id, "gid://platform/Location/42");
        assert_eq!(a.collections_to_join, vec!["gid://platform/Collection/9".to_string()]);
    }

    #[test]
    fn no_location_means_no_inventory() {
        let ws = sheet(&[["a", "", "Color", "Red", "", "", "", "", "7"]]);
        let products = mapper().build(ws, None, None).unwrap();
        assert!(products.get("a").unwrap().variants[0].inventory_quantities.is_empty());
    }

    #[test]
    fn invalid_ids_fail_before_rows() {
        let ws = sheet(&[["a", "", "Color", "Red", "", "", "", "", ""]]);
        let err = mapper().build(ws.clone(), Some(&"gid://platform/XXX/123".into()), None).unwrap_err();
        assert_eq!(err.to_string(), "Invalid location_id");
        let err = mapper().build(ws, None, Some(&"gid://platform/x/23".into())).unwrap_err();
        assert_eq!(err.to_string(), "Invalid collection_id");
    }

    #[test]
    fn second_option_slot_is_positional() {
        let ws = sheet(&[
            ["a", "", "Color", "Red", "Size", "S", "", "", ""],
            ["a", "", "", "Red", "", "M", "", "", ""],
        ]);
        let products = mapper().build(ws, None, None).unwrap();
        let a = products.get("a").unwrap();
        assert_eq!(a.options.len(), 2);
        assert_eq!(a.variants[1].options.tuple(), [Some("Red"), Some("M"), None]);
    }

    #[test]
    fn values_without_option_names_are_dropped() {
        let ws = sheet(&[
            ["a", "", "Color", "Red", "", "S", "", "", ""],
            ["a", "", "", "Blue", "", "M", "", "", ""],
        ]);
        let products = mapper().build(ws, None, None).unwrap();
        let a = products.get("a").unwrap();
        assert_eq!(a.options.len(), 1);
        for variant in &a.variants {
            assert!(variant.options.len() <= a.options.len());
        }
        assert_eq!(a.variants[0].options.tuple(), [Some("Red"), None, None]);
        assert_eq!(a.variants[1].options.tuple(), [Some("Blue"), None, None]);
    }

    #[test]
    fn fractional_quantities_round_to_nearest() {
        let ws = sheet(&[
            ["a", "", "Color", "Red", "", "", "", "", "2.6"],
            ["a", "", "Color", "Blue", "", "", "", "", "2.4"],
        ]);
        let products = mapper().build(ws, Some(&ResourceId::Int(42)), None).unwrap();
        let a = products.get("a").unwrap();
        assert_eq!(a.variants[0].inventory_quantities[0].available_quantity, 3);
        assert_eq!(a.variants[1].inventory_quantities[0].available_quantity, 2);
    }

    #[test]
    fn padded_global_id_of_another_type_is_not_a_location() {
        let ws = sheet(&[["a", "", "Color", "Red", "", "", "", "", ""]]);
        let err = mapper().build(ws, Some(&" gid://platform/Product/42".into()), None).unwrap_err();
        assert_eq!(err.to_string(), "Invalid location_id");
    }
}

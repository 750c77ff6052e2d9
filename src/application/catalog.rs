use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::BackendError;
use crate::domain::ports::{ObjectStore, ProductStore};
use crate::domain::product::{NewProduct, Product, ProductFilter, ProductPatch};

/// Bucket holding all product imagery.
pub const PRODUCT_IMAGE_BUCKET: &str = "product-images";

/// Catalog reads plus the back-office product operations, including image
/// storage housekeeping.
pub struct CatalogService {
    products: Arc<dyn ProductStore>,
    objects: Arc<dyn ObjectStore>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductStore>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { products, objects }
    }

    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, BackendError> {
        self.products.list(filter).await
    }

    pub async fn find(&self, id: &str) -> Result<Product, BackendError> {
        self.products.find(id).await?.ok_or(BackendError::NotFound)
    }

    pub async fn create(&self, product: NewProduct) -> Result<Product, BackendError> {
        self.products.insert(product).await
    }

    pub async fn update(
        &self,
        id: &str,
        patch: ProductPatch,
    ) -> Result<Product, BackendError> {
        if patch.is_empty() {
            return self.find(id).await;
        }
        self.products.update(id, patch).await
    }

    /// Deletes a product after removing its stored images. Image cleanup is
    /// best effort: a storage failure is logged and the record is deleted
    /// anyway.
    pub async fn delete(&self, id: &str) -> Result<(), BackendError> {
        let product = self.find(id).await?;

        let paths: Vec<String> = std::iter::once(&product.image)
            .chain(product.images.iter())
            .filter_map(|url| storage_path(url))
            .collect();
        if !paths.is_empty() {
            if let Err(e) = self.objects.remove(PRODUCT_IMAGE_BUCKET, &paths).await {
                log::warn!("Image cleanup for product {} failed: {}", id, e);
            }
        }

        self.products.delete(id).await
    }

    /// Stores an uploaded image under a collision-free name and returns its
    /// public URL.
    pub async fn upload_image(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BackendError> {
        let path = format!("products/{}-{}", Uuid::new_v4(), safe_filename(filename));
        self.objects
            .upload(PRODUCT_IMAGE_BUCKET, &path, bytes, content_type)
            .await
    }
}

/// Extracts the in-bucket object path from a public image URL; `None` for
/// URLs that do not point into the product image bucket (seeded external
/// imagery, for instance).
fn storage_path(url: &str) -> Option<String> {
    let marker = format!("/{}/", PRODUCT_IMAGE_BUCKET);
    let idx = url.find(&marker)?;
    let path = &url[idx + marker.len()..];
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

/// Client-supplied file names become part of the object path, so anything
/// outside a conservative character set is replaced.
fn safe_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

//! Shopify Admin REST client

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::payload::{
    plan_images, ImageEnvelope, ImageInput, ProductEnvelope, ProductUpdate, RemoteImageList,
    RemoteVariantEnvelope, VariantEnvelope, VariantInput, MEDIA_ALT_PREFIX,
};
use super::{ClientFactory, RemoteCatalog, ShopifyError};
use crate::domain::aggregates::{Base, Colorway, Integration, Media};

/// Credential blob stored on a Shopify integration.
#[derive(Clone, Deserialize)]
pub struct ShopifyCredentials {
    pub shop_domain: String,
    pub access_token: String,
}

impl ShopifyCredentials {
    pub fn from_integration(integration: &Integration) -> Result<Self, ShopifyError> {
        let credentials: Self = serde_json::from_value(integration.credentials.clone())
            .map_err(|e| ShopifyError::InvalidCredentials(e.to_string()))?;
        if credentials.shop_domain.trim().is_empty() {
            return Err(ShopifyError::InvalidCredentials("shop_domain is empty".into()));
        }
        if credentials.access_token.trim().is_empty() {
            return Err(ShopifyError::InvalidCredentials("access_token is empty".into()));
        }
        Ok(credentials)
    }
}

pub struct ShopifyClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    media_base_url: String,
}

impl ShopifyClient {
    pub fn new(http: reqwest::Client, credentials: ShopifyCredentials, api_version: &str, media_base_url: &str) -> Self {
        let shop = credentials.shop_domain.trim().trim_end_matches('/');
        let shop = shop.strip_prefix("https://").unwrap_or(shop);
        Self::with_base_url(http, format!("https://{shop}/admin/api/{api_version}"), credentials.access_token, media_base_url)
    }

    /// Client for an explicit Admin API root, e.g. `https://shop.myshopify.com/admin/api/2024-10`.
    pub fn with_base_url(http: reqwest::Client, base_url: impl Into<String>, access_token: impl Into<String>, media_base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            media_base_url: media_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    fn media_url(&self, file_path: &str) -> String {
        format!("{}/{}", self.media_base_url, file_path.trim_start_matches('/'))
    }

    async fn request<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: Option<&B>) -> Result<serde_json::Value, ShopifyError> {
        let mut req = self
            .http
            .request(method, format!("{}/{}", self.base_url, path))
            .header("X-Shopify-Access-Token", &self.access_token);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        let body = if text.trim().is_empty() { serde_json::Value::Null } else {
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
        };
        classify(status, path, body)
    }

    async fn get(&self, path: &str) -> Result<serde_json::Value, ShopifyError> {
        self.request::<()>(Method::GET, path, None).await
    }

    async fn delete(&self, path: &str) -> Result<serde_json::Value, ShopifyError> {
        self.request::<()>(Method::DELETE, path, None).await
    }
}

/// Maps an HTTP status and decoded body to success or a classified error.
pub(crate) fn classify(status: StatusCode, path: &str, body: serde_json::Value) -> Result<serde_json::Value, ShopifyError> {
    if status.is_success() {
        return Ok(body);
    }
    let message = match body.get("errors") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None if body.is_null() => status.canonical_reason().unwrap_or("no body").to_string(),
        None => body.to_string(),
    };
    let code = status.as_u16();
    Err(match status {
        StatusCode::NOT_FOUND => ShopifyError::NotFound(path.to_string()),
        StatusCode::TOO_MANY_REQUESTS => ShopifyError::Unavailable { status: code, message },
        s if s.is_server_error() => ShopifyError::Unavailable { status: code, message },
        _ => ShopifyError::Api { status: code, message },
    })
}

fn numeric_id(id: &str) -> Result<i64, ShopifyError> {
    id.parse().map_err(|_| ShopifyError::UnexpectedResponse(format!("non-numeric Shopify id {id:?}")))
}

fn decode<T: serde::de::DeserializeOwned>(body: serde_json::Value) -> Result<T, ShopifyError> {
    serde_json::from_value(body).map_err(|e| ShopifyError::UnexpectedResponse(e.to_string()))
}

#[async_trait]
impl RemoteCatalog for ShopifyClient {
    async fn create_variant(&self, product_id: &str, base: &Base, quantity: i32) -> Result<String, ShopifyError> {
        let body = VariantEnvelope { variant: VariantInput::new_variant(base, quantity) };
        let created: RemoteVariantEnvelope = decode(
            self.request(Method::POST, &format!("products/{product_id}/variants.json"), Some(&body)).await?,
        )?;
        Ok(created.variant.id.to_string())
    }

    async fn update_variant(&self, variant_id: &str, base: &Base) -> Result<(), ShopifyError> {
        let variant = VariantInput { id: Some(numeric_id(variant_id)?), ..VariantInput::for_base(base) };
        self.request(Method::PUT, &format!("variants/{variant_id}.json"), Some(&VariantEnvelope { variant })).await?;
        Ok(())
    }

    async fn delete_variant(&self, variant_id: &str) -> Result<(), ShopifyError> {
        let remote: RemoteVariantEnvelope = match self.get(&format!("variants/{variant_id}.json")).await {
            Ok(body) => decode(body)?,
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(e),
        };
        let path = format!("products/{}/variants/{}.json", remote.variant.product_id, remote.variant.id);
        match self.delete(&path).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn update_product(&self, colorway: &Colorway, product_id: &str) -> Result<(), ShopifyError> {
        let product = ProductUpdate::from_colorway(numeric_id(product_id)?, colorway);
        self.request(Method::PUT, &format!("products/{product_id}.json"), Some(&ProductEnvelope { product })).await?;
        Ok(())
    }

    async fn sync_images(&self, colorway: &Colorway, media: &[Media], product_id: &str) -> Result<(), ShopifyError> {
        let remote: RemoteImageList = decode(self.get(&format!("products/{product_id}/images.json")).await?)?;
        let plan = plan_images(&remote.images, media);
        tracing::debug!(
            colorway_id = %colorway.id,
            product_id,
            remove = plan.remove.len(),
            add = plan.add.len(),
            reposition = plan.reposition.len(),
            "reconciling product images"
        );

        for image_id in plan.remove {
            match self.delete(&format!("products/{product_id}/images/{image_id}.json")).await {
                Ok(_) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }
        for upload in plan.add {
            let image = ImageInput {
                id: None,
                src: Some(self.media_url(&upload.file_path)),
                alt: Some(format!("{MEDIA_ALT_PREFIX}{}", upload.media_id)),
                position: upload.position,
            };
            self.request(Method::POST, &format!("products/{product_id}/images.json"), Some(&ImageEnvelope { image })).await?;
        }
        for (image_id, position) in plan.reposition {
            let image = ImageInput { id: Some(image_id), src: None, alt: None, position };
            self.request(Method::PUT, &format!("products/{product_id}/images/{image_id}.json"), Some(&ImageEnvelope { image })).await?;
        }
        Ok(())
    }
}

/// Builds [`ShopifyClient`]s sharing one connection pool.
#[derive(Clone)]
pub struct ShopifyClientFactory {
    http: reqwest::Client,
    api_version: String,
    media_base_url: String,
}

impl ShopifyClientFactory {
    pub fn new(http: reqwest::Client, api_version: impl Into<String>, media_base_url: impl Into<String>) -> Self {
        Self { http, api_version: api_version.into(), media_base_url: media_base_url.into() }
    }

    pub fn client_for(&self, integration: &Integration) -> Result<ShopifyClient, ShopifyError> {
        let credentials = ShopifyCredentials::from_integration(integration)?;
        Ok(ShopifyClient::new(self.http.clone(), credentials, &self.api_version, &self.media_base_url))
    }
}

impl ClientFactory for ShopifyClientFactory {
    fn connect(&self, integration: &Integration) -> Result<Arc<dyn RemoteCatalog>, ShopifyError> {
        Ok(Arc::new(self.client_for(integration)?))
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_cart::CartEntry;
use bazaar_catalog::{NewProduct, Product, ProductFilter, ProductUpdate};
use bazaar_infra::{Pagination, PostedReview};
use bazaar_orders::{Order, OrderLine};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: u64,
    pub stock: u32,
    pub category: String,
    pub image_url: Option<String>,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(value: CreateProductRequest) -> Self {
        NewProduct {
            name: value.name,
            description: value.description,
            price: value.price,
            stock: value.stock,
            category: value.category,
            image_url: value.image_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: u64,
    pub stock: u32,
    pub category: String,
    pub image_url: Option<String>,
}

impl From<UpdateProductRequest> for ProductUpdate {
    fn from(value: UpdateProductRequest) -> Self {
        ProductUpdate {
            name: value.name,
            description: value.description,
            price: value.price,
            stock: value.stock,
            category: value.category,
            image_url: value.image_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub page: Option<usize>,
    pub size: Option<usize>,
    pub category: Option<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
}

impl ListProductsQuery {
    pub fn filter(&self) -> ProductFilter {
        ProductFilter {
            category: self.category.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
        }
    }

    pub fn pagination(&self) -> Pagination {
        pagination(self.page, self.size)
    }
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub size: Option<usize>,
}

impl PageQuery {
    pub fn pagination(&self) -> Pagination {
        pagination(self.page, self.size)
    }
}

const MAX_PAGE_SIZE: usize = 100;

fn pagination(page: Option<usize>, size: Option<usize>) -> Pagination {
    let size = size.unwrap_or(Pagination::DEFAULT_LIMIT).min(MAX_PAGE_SIZE);
    Pagination::page(page.unwrap_or(0), size)
}

#[derive(Debug, Deserialize)]
pub struct AddCartItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub content: String,
    pub rating: u8,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub seller_id: String,
    pub name: String,
    pub description: String,
    pub price: u64,
    pub stock: u32,
    pub category: String,
    pub image_url: Option<String>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_string(),
            seller_id: product.seller_id.to_string(),
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            category: product.category,
            image_url: product.image_url,
            version: product.version.value(),
            created_at: product.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartItemResponse {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

impl From<CartEntry> for CartItemResponse {
    fn from(entry: CartEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            product_id: entry.product_id.to_string(),
            quantity: entry.quantity,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderLineResponse {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: u64,
    pub subtotal: u64,
}

impl From<&OrderLine> for OrderLineResponse {
    fn from(line: &OrderLine) -> Self {
        Self {
            product_id: line.product_id.to_string(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            subtotal: line.subtotal(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub placed_at: DateTime<Utc>,
    pub lines: Vec<OrderLineResponse>,
    pub total: u64,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            placed_at: order.placed_at(),
            lines: order.lines().iter().map(OrderLineResponse::from).collect(),
            total: order.total(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: String,
    pub product_id: String,
    pub author_id: String,
    pub rating: u8,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub verified_purchase: bool,
}

impl From<PostedReview> for ReviewResponse {
    fn from(posted: PostedReview) -> Self {
        Self {
            id: posted.review.id.to_string(),
            product_id: posted.review.product_id.to_string(),
            author_id: posted.review.author_id.to_string(),
            rating: posted.review.rating,
            content: posted.review.content,
            created_at: posted.review.created_at,
            verified_purchase: posted.verified_purchase,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PurchaseCheckResponse {
    pub purchased: bool,
}

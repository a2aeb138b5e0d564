use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Multipart, Path},
    http::StatusCode,
    response::IntoResponse,
};

use tienda_catalog::{NewProduct, ProductPatch};
use tienda_core::{DomainError, ProductId, money};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.store.list_products().await {
        Ok(products) => {
            let body: Vec<_> = products
                .iter()
                .map(|p| dto::product_to_json(p, &services.public_base_url))
                .collect();
            Json(body).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Product fields as read from a multipart form.
///
/// The upload's bytes are discarded here: image blobs live in an external
/// store, the catalog only keeps the reference.
#[derive(Debug, Default)]
struct ProductForm {
    nombre: Option<String>,
    descripcion: Option<String>,
    tipo: Option<String>,
    precio: Option<String>,
    stock: Option<String>,
    condicion: Option<String>,
    imagen: Option<String>,
}

async fn read_product_form(mut multipart: Multipart) -> Result<ProductForm, axum::response::Response> {
    let mut form = ProductForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| errors::invalid_body_response())?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "imagen" {
            let reference = field.file_name().map(|f| format!("productos/{f}"));
            // Drain the upload; only the reference is kept.
            let _ = field
                .bytes()
                .await
                .map_err(|_| errors::invalid_body_response())?;
            if reference.is_some() {
                form.imagen = reference;
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|_| errors::invalid_body_response())?;

        match name.as_str() {
            "nombre" => form.nombre = Some(value),
            "descripcion" => form.descripcion = Some(value),
            "tipo" => form.tipo = Some(value),
            "precio" => form.precio = Some(value),
            "stock" => form.stock = Some(value),
            "condicion" => form.condicion = Some(value),
            _ => {}
        }
    }

    Ok(form)
}

fn parse_stock(raw: &str) -> Result<i64, axum::response::Response> {
    raw.trim().parse::<i64>().map_err(|_| {
        errors::domain_error_to_response(&DomainError::validation(format!(
            "invalid stock {raw:?}"
        )))
    })
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    multipart: Multipart,
) -> axum::response::Response {
    let form = match read_product_form(multipart).await {
        Ok(form) => form,
        Err(resp) => return resp,
    };

    let (Some(nombre), Some(precio), Some(stock)) = (form.nombre, form.precio, form.stock)
    else {
        return errors::domain_error_to_response(&DomainError::validation(
            "nombre, precio and stock are required",
        ));
    };

    let precio = match money::parse_amount(&precio) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(&e),
    };
    let stock = match parse_stock(&stock) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let new_product = match NewProduct::validate(
        nombre,
        form.descripcion.unwrap_or_default(),
        form.tipo.unwrap_or_default(),
        precio,
        stock,
        form.condicion.unwrap_or_default(),
        form.imagen,
    ) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(&e),
    };

    match services.store.create_product(new_product).await {
        Ok(product) => (
            StatusCode::CREATED,
            Json(dto::product_to_json(&product, &services.public_base_url)),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn edit_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(&e),
    };

    let form = match read_product_form(multipart).await {
        Ok(form) => form,
        Err(resp) => return resp,
    };

    let precio = match form.precio.as_deref().map(money::parse_amount).transpose() {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(&e),
    };
    let stock = match form.stock.as_deref().map(parse_stock).transpose() {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let patch = ProductPatch {
        name: form.nombre,
        description: form.descripcion,
        category: form.tipo,
        price: precio,
        stock,
        condition: form.condicion,
        image: form.imagen,
    };

    match services.store.update_product(id, patch).await {
        Ok(product) => {
            Json(dto::product_to_json(&product, &services.public_base_url)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

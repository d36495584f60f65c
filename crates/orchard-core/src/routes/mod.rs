//! Route table

pub mod docs;
pub mod errors;
pub mod fruits;
pub mod home;
pub mod vegetables;

use crate::handlers;
use crate::{App, Chain, Method, Result};

/// Register every route on `app`
pub fn register(app: &mut App) -> Result<()> {
    app.route(Method::Get, "/", Chain::of(home::homepage))?;
    app.route(Method::Get, "/api-docs", Chain::of(docs::api_docs))?;
    app.route(Method::Get, "/throw-err", Chain::of(errors::throw_err))?;

    // Fruits
    app.route(Method::Post, "/fruits", Chain::of(fruits::create_fruit))?;
    app.route(
        Method::Get,
        "/fruits",
        Chain::new()
            .then(fruits::log_attempt)
            .then(fruits::log_continue)
            .then(fruits::list_fruits),
    )?;
    app.route(
        Method::Put,
        "/fruits/:id",
        Chain::of(fruits::replace_fruit).then(handlers::not_found),
    )?;
    app.route(Method::Patch, "/fruits/:id", Chain::of(fruits::merge_fruit))?;
    app.route(Method::Delete, "/fruits/:id", Chain::of(fruits::delete_fruit))?;

    // Vegetables
    app.route(Method::Post, "/vegetables", Chain::of(vegetables::not_implemented))?;
    app.route(Method::Get, "/vegetables", Chain::of(vegetables::not_implemented))?;
    app.route(Method::Put, "/vegetables/:id", Chain::of(vegetables::not_implemented))?;
    app.route(Method::Delete, "/vegetables/:id", Chain::of(vegetables::not_implemented))?;

    Ok(())
}

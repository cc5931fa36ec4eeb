//! Index Bootstrap
//!
//! Creates the indexes the repositories rely on. Runs once at startup;
//! creation is idempotent on the server side. Username and email
//! uniqueness is enforced here, not by application-level locking.

use mongodb::{
    bson::doc,
    options::IndexOptions,
    Database, IndexModel,
};
use tracing::info;

use crate::domain::{Account, Todo};
use crate::error::Result;

pub async fn ensure_indexes(db: &Database) -> Result<()> {
    let accounts = db.collection::<Account>("accounts");

    accounts
        .create_index(
            IndexModel::builder()
                .keys(doc! { "username": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;

    // Sparse so that accounts without an email do not collide.
    accounts
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(IndexOptions::builder().unique(true).sparse(true).build())
                .build(),
        )
        .await?;

    accounts
        .create_index(IndexModel::builder().keys(doc! { "isActive": 1 }).build())
        .await?;

    accounts
        .create_index(IndexModel::builder().keys(doc! { "createdAt": 1 }).build())
        .await?;

    let todos = db.collection::<Todo>("todos");

    todos
        .create_index(IndexModel::builder().keys(doc! { "deadline": 1 }).build())
        .await?;

    todos
        .create_index(IndexModel::builder().keys(doc! { "username": 1 }).build())
        .await?;

    // Backs the non-wildcard search mode.
    todos
        .create_index(
            IndexModel::builder()
                .keys(doc! { "title": "text", "description": "text" })
                .build(),
        )
        .await?;

    info!("database indexes ensured");
    Ok(())
}

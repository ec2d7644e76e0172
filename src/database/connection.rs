use mongodb::{bson::doc, options::IndexOptions, Client, Collection, Database, IndexModel};

use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::user::User;

pub async fn get_db_client(config: &AppConfig) -> Database {
    let client = Client::with_uri_str(&config.database_url)
        .await
        .expect("Failed to connect to MongoDB");

    tracing::info!("Connected to MongoDB database '{}'", config.database_name);

    client.database(&config.database_name)
}

/// Email uniqueness is enforced by the store itself; the handler's lookup is
/// only a fast path. Without this index two concurrent registrations could
/// both pass the lookup and both insert.
pub async fn ensure_indexes(db: &Database) -> Result<()> {
    let users: Collection<User> = db.collection("users");
    users.create_index(email_unique_index()).await?;
    Ok(())
}

fn email_unique_index() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_index_is_unique() {
        let index = email_unique_index();
        assert_eq!(index.keys, doc! { "email": 1 });
        assert_eq!(index.options.and_then(|o| o.unique), Some(true));
    }
}

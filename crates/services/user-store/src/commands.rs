//! CLI command implementations.
//!
//! Each command runs against a ready [`Database`] and returns the JSON value
//! to print.

use serde_json::{json, Value};

use common::{DbError, DbResult};
use domain::{Password, RecordId, User};

use crate::cli::{Commands, RecordAction, UsersAction};
use crate::repository::Database;

/// Execute a command.
pub async fn execute(command: Commands, db: &dyn Database) -> DbResult<Value> {
    match command {
        Commands::Ping => {
            db.ping().await?;
            Ok(json!({ "status": "ok" }))
        }
        Commands::Users { action } => users(action, db).await,
        Commands::Addresses { action } => match action {
            RecordAction::List => to_json(db.get_addresses().await?),
            RecordAction::Get { id } => to_json(db.get_address(&RecordId::from(id)).await?),
        },
        Commands::Cards { action } => match action {
            RecordAction::List => to_json(db.get_cards().await?),
            RecordAction::Get { id } => to_json(db.get_card(&RecordId::from(id)).await?),
        },
    }
}

async fn users(action: UsersAction, db: &dyn Database) -> DbResult<Value> {
    match action {
        UsersAction::List => to_json(db.get_users().await?),
        UsersAction::Get { id } => to_json(db.get_user(&RecordId::from(id)).await?),
        UsersAction::Find { username } => to_json(db.get_user_by_name(&username).await?),
        UsersAction::Create {
            username,
            first_name,
            last_name,
            email,
            password,
        } => {
            let mut user = User::new(username)
                .with_name(first_name, last_name)
                .with_email(email);
            if let Some(plain) = password {
                user = user.with_password(Password::new(&plain)?);
            }

            db.create_user(&mut user).await?;
            to_json(user)
        }
    }
}

fn to_json(value: impl serde::Serialize) -> DbResult<Value> {
    serde_json::to_value(value).map_err(|e| DbError::decode(e.to_string()))
}

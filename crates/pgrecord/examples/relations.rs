//! Loading relations between two model types.
//!
//! Run with: cargo run --example relations -p pgrecord
//!
//! Connection settings are read from DB_USER, DB_PASSWORD, DB_NAME, DB_HOST
//! and DB_PORT (a .env file is honored). Set RUST_LOG=pgrecord=debug to see
//! the SQL being executed.

use pgrecord::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> OrmResult<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let options = ConnectionOptions::from_env()?;
    let conn = Connection::connect(&options).await?;

    let mut registry = Registry::new();
    registry
        .register(ModelSchema::new("User", "users"))
        .define_relation("posts", RelationDescriptor::one_to_many("Post", "id", "user_id"));
    registry
        .register(ModelSchema::new("Post", "posts"))
        .define_relation("user", RelationDescriptor::one_to_one("User", "user_id", "id"));

    let ctx = ModelContext::with_connection(registry, conn);

    // ============================================
    // User -> posts (one-to-many)
    // ============================================
    println!("=== posts of user 1 ===");
    match ctx.model("User")?.find_by_id(1).await? {
        Some(user) => {
            let posts = user.load_relation(&ctx, "posts").await?.into_rows();
            print_json(&posts);
        }
        None => println!("user 1 not found"),
    }

    // ============================================
    // Post -> user (one-to-one)
    // ============================================
    println!("=== author of post 1 ===");
    match ctx.model("Post")?.find_by_id(1).await? {
        Some(post) => match post.load_relation(&ctx, "user").await? {
            Loaded::One(Some(user)) => print_json(&user),
            _ => println!("post 1 has no author"),
        },
        None => println!("post 1 not found"),
    }

    if let Ok(conn) = ctx.into_connection() {
        conn.disconnect().await;
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("failed to render result: {e}"),
    }
}

use std::str::FromStr;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

const CREATE_RESTAURANTS: &str = r#"
CREATE TABLE IF NOT EXISTS restaurants (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    cuisine TEXT,
    isVeg BOOLEAN,
    rating REAL,
    priceForTwo INTEGER,
    location TEXT,
    hasOutdoorSeating BOOLEAN,
    isLuxury BOOLEAN
)"#;

const CREATE_DISHES: &str = r#"
CREATE TABLE IF NOT EXISTS dishes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    isVeg BOOLEAN,
    rating REAL,
    price INTEGER
)"#;

pub struct NewRestaurant {
    pub name: &'static str,
    pub cuisine: &'static str,
    pub is_veg: bool,
    pub rating: f64,
    pub price_for_two: i64,
    pub location: &'static str,
    pub has_outdoor_seating: bool,
    pub is_luxury: bool,
}

pub struct NewDish {
    pub name: &'static str,
    pub is_veg: bool,
    pub rating: f64,
    pub price: i64,
}

pub const RESTAURANTS: [NewRestaurant; 3] = [
    NewRestaurant {
        name: "Spice Kitchen",
        cuisine: "Indian",
        is_veg: true,
        rating: 4.5,
        price_for_two: 1500,
        location: "MG Road",
        has_outdoor_seating: true,
        is_luxury: false,
    },
    NewRestaurant {
        name: "Olive Bistro",
        cuisine: "Italian",
        is_veg: false,
        rating: 4.2,
        price_for_two: 2000,
        location: "Jubilee Hills",
        has_outdoor_seating: false,
        is_luxury: true,
    },
    NewRestaurant {
        name: "Green Leaf",
        cuisine: "Chinese",
        is_veg: true,
        rating: 4.0,
        price_for_two: 1000,
        location: "Banjara Hills",
        has_outdoor_seating: false,
        is_luxury: false,
    },
];

pub const DISHES: [NewDish; 3] = [
    NewDish {
        name: "Paneer Butter Masala",
        is_veg: true,
        rating: 4.5,
        price: 300,
    },
    NewDish {
        name: "Chicken Alfredo Pasta",
        is_veg: false,
        rating: 4.7,
        price: 500,
    },
    NewDish {
        name: "Veg Hakka Noodles",
        is_veg: true,
        rating: 4.3,
        price: 250,
    },
];

/// Open a writable pool, creating the database file if it does not exist yet.
pub async fn connect(url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("invalid database url {url}"))?
        .create_if_missing(true);
    SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .with_context(|| format!("fail to open database {url}"))
}

/// Single connection in-memory database with the schema and fixtures loaded.
///
/// Every connection to `sqlite::memory:` is its own database, so the pool is
/// capped at one connection which is never recycled.
pub async fn in_memory() -> anyhow::Result<SqlitePool> {
    let pool = empty_in_memory().await?;
    insert_fixtures(&pool).await?;
    Ok(pool)
}

/// Same as [`in_memory`] but without any rows.
pub async fn empty_in_memory() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .context("fail to open in-memory database")?;
    create_schema(&pool).await?;
    Ok(pool)
}

pub async fn create_schema(db_conn: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(CREATE_RESTAURANTS)
        .execute(db_conn)
        .await
        .context("fail to create restaurants table")?;
    tracing::info!("restaurants table created or already exists");

    sqlx::query(CREATE_DISHES)
        .execute(db_conn)
        .await
        .context("fail to create dishes table")?;
    tracing::info!("dishes table created or already exists");

    Ok(())
}

pub async fn add_restaurant(db_conn: &SqlitePool, rest: &NewRestaurant) -> anyhow::Result<i64> {
    let id = sqlx::query(
        r#"
INSERT INTO restaurants
    (name, cuisine, isVeg, rating, priceForTwo, location, hasOutdoorSeating, isLuxury)
VALUES
    (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(rest.name)
    .bind(rest.cuisine)
    .bind(rest.is_veg)
    .bind(rest.rating)
    .bind(rest.price_for_two)
    .bind(rest.location)
    .bind(rest.has_outdoor_seating)
    .bind(rest.is_luxury)
    .execute(db_conn)
    .await
    .with_context(|| format!("fail to add restaurant {}", rest.name))?
    .last_insert_rowid();
    Ok(id)
}

pub async fn add_dish(db_conn: &SqlitePool, dish: &NewDish) -> anyhow::Result<i64> {
    let id = sqlx::query("INSERT INTO dishes (name, isVeg, rating, price) VALUES (?, ?, ?, ?)")
        .bind(dish.name)
        .bind(dish.is_veg)
        .bind(dish.rating)
        .bind(dish.price)
        .execute(db_conn)
        .await
        .with_context(|| format!("fail to add dish {}", dish.name))?
        .last_insert_rowid();
    Ok(id)
}

/// Insert the fixture set. Returns how many restaurants and dishes were added.
pub async fn insert_fixtures(db_conn: &SqlitePool) -> anyhow::Result<(usize, usize)> {
    for rest in &RESTAURANTS {
        add_restaurant(db_conn, rest).await?;
    }
    tracing::info!("inserted {} restaurants into the database", RESTAURANTS.len());

    for dish in &DISHES {
        add_dish(db_conn, dish).await?;
    }
    tracing::info!("inserted {} dishes into the database", DISHES.len());

    Ok((RESTAURANTS.len(), DISHES.len()))
}

#[tokio::test]
async fn test_fixture_ids_are_sequential() {
    let db = empty_in_memory().await.unwrap();
    let (rests, dishes) = insert_fixtures(&db).await.unwrap();
    assert_eq!((rests, dishes), (3, 3));

    let id = add_dish(&db, &DISHES[0]).await.unwrap();
    assert_eq!(id, 4);
}

#[tokio::test]
async fn test_create_schema_is_idempotent() {
    let db = in_memory().await.unwrap();
    create_schema(&db).await.unwrap();

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM restaurants")
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(count, 3);
}

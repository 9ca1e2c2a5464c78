use std::str::FromStr;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::data::{Dish, DishList, Restaurant, RestaurantList};

/// Open the database the api server reads from.
///
/// The connection is read only and the schema must already exist, run the
/// seeder first on a fresh database.
pub async fn connect(url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("invalid database url {url}"))?
        .read_only(true);
    let db_conn = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .with_context(|| format!("fail to open database {url}"))?;

    let (tables,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('restaurants', 'dishes')",
    )
    .fetch_one(&db_conn)
    .await
    .context("fail to inspect database schema")?;
    anyhow::ensure!(
        tables == 2,
        "database {url} is missing the restaurants or dishes table"
    );

    Ok(db_conn)
}

pub async fn get_restaurants(db_conn: &SqlitePool) -> anyhow::Result<RestaurantList> {
    let restaurants = sqlx::query_as::<_, Restaurant>("SELECT * FROM restaurants")
        .fetch_all(db_conn)
        .await
        .context("fail to get restaurants")?;
    Ok(RestaurantList { restaurants })
}

pub async fn get_restaurant_by_id(db_conn: &SqlitePool, id: i64) -> anyhow::Result<RestaurantList> {
    let restaurants = sqlx::query_as::<_, Restaurant>("SELECT * FROM restaurants WHERE id = ?")
        .bind(id)
        .fetch_all(db_conn)
        .await
        .with_context(|| format!("fail to get restaurant {id}"))?;
    Ok(RestaurantList { restaurants })
}

pub async fn get_restaurants_by_cuisine(
    db_conn: &SqlitePool,
    cuisine: &str,
) -> anyhow::Result<RestaurantList> {
    let restaurants =
        sqlx::query_as::<_, Restaurant>("SELECT * FROM restaurants WHERE cuisine = ?")
            .bind(cuisine)
            .fetch_all(db_conn)
            .await
            .with_context(|| format!("fail to get restaurants by cuisine {cuisine}"))?;
    Ok(RestaurantList { restaurants })
}

/// All three features must match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureFilter {
    pub is_veg: bool,
    pub has_outdoor_seating: bool,
    pub is_luxury: bool,
}

pub async fn get_restaurants_by_features(
    db_conn: &SqlitePool,
    filter: FeatureFilter,
) -> anyhow::Result<RestaurantList> {
    let restaurants = sqlx::query_as::<_, Restaurant>(
        r#"
SELECT * FROM restaurants
WHERE
    isVeg = ? AND hasOutdoorSeating = ? AND isLuxury = ?"#,
    )
    .bind(filter.is_veg)
    .bind(filter.has_outdoor_seating)
    .bind(filter.is_luxury)
    .fetch_all(db_conn)
    .await
    .with_context(|| format!("fail to get restaurants by {filter:?}"))?;
    Ok(RestaurantList { restaurants })
}

pub async fn get_restaurants_by_rating(db_conn: &SqlitePool) -> anyhow::Result<RestaurantList> {
    let restaurants =
        sqlx::query_as::<_, Restaurant>("SELECT * FROM restaurants ORDER BY rating DESC")
            .fetch_all(db_conn)
            .await
            .context("fail to get restaurants ordered by rating")?;
    Ok(RestaurantList { restaurants })
}

pub async fn get_dishes(db_conn: &SqlitePool) -> anyhow::Result<DishList> {
    let dishes = sqlx::query_as::<_, Dish>("SELECT * FROM dishes")
        .fetch_all(db_conn)
        .await
        .context("fail to get dishes")?;
    Ok(DishList { dishes })
}

pub async fn get_dish_by_id(db_conn: &SqlitePool, id: i64) -> anyhow::Result<DishList> {
    let dishes = sqlx::query_as::<_, Dish>("SELECT * FROM dishes WHERE id = ?")
        .bind(id)
        .fetch_all(db_conn)
        .await
        .with_context(|| format!("fail to get dish {id}"))?;
    Ok(DishList { dishes })
}

pub async fn get_dishes_by_veg(db_conn: &SqlitePool, is_veg: bool) -> anyhow::Result<DishList> {
    let dishes = sqlx::query_as::<_, Dish>("SELECT * FROM dishes WHERE isVeg = ?")
        .bind(is_veg)
        .fetch_all(db_conn)
        .await
        .with_context(|| format!("fail to get dishes with isVeg = {is_veg}"))?;
    Ok(DishList { dishes })
}

pub async fn get_dishes_by_price(db_conn: &SqlitePool) -> anyhow::Result<DishList> {
    let dishes = sqlx::query_as::<_, Dish>("SELECT * FROM dishes ORDER BY price ASC")
        .fetch_all(db_conn)
        .await
        .context("fail to get dishes ordered by price")?;
    Ok(DishList { dishes })
}

#[tokio::test]
async fn test_get_restaurant_by_id() {
    let db = crate::seed::in_memory().await.unwrap();

    let list = get_restaurant_by_id(&db, 2).await.unwrap();
    assert_eq!(list.restaurants.len(), 1);
    let rest = &list.restaurants[0];
    assert_eq!(rest.id, 2);
    assert_eq!(rest.name, "Olive Bistro");
    assert_eq!(rest.price_for_two, 2000);
    assert!(!rest.is_veg);
    assert!(rest.is_luxury);

    assert!(get_restaurant_by_id(&db, 42).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_restaurants_by_features() {
    let db = crate::seed::in_memory().await.unwrap();

    let filter = FeatureFilter {
        is_veg: true,
        has_outdoor_seating: true,
        is_luxury: false,
    };
    let list = get_restaurants_by_features(&db, filter).await.unwrap();
    let names: Vec<_> = list.restaurants.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Spice Kitchen"]);

    let filter = FeatureFilter {
        is_luxury: true,
        ..filter
    };
    assert!(get_restaurants_by_features(&db, filter)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_cuisine_is_exact_match() {
    let db = crate::seed::in_memory().await.unwrap();

    let list = get_restaurants_by_cuisine(&db, "Italian").await.unwrap();
    assert_eq!(list.restaurants.len(), 1);
    assert_eq!(list.restaurants[0].name, "Olive Bistro");

    assert!(get_restaurants_by_cuisine(&db, "italian").await.unwrap().is_empty());
    assert!(get_restaurants_by_cuisine(&db, "Italian' OR '1'='1")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_sorted_queries() {
    let db = crate::seed::in_memory().await.unwrap();

    let ratings: Vec<f64> = get_restaurants_by_rating(&db)
        .await
        .unwrap()
        .restaurants
        .iter()
        .map(|r| r.rating)
        .collect();
    assert_eq!(ratings, [4.5, 4.2, 4.0]);

    let prices: Vec<i64> = get_dishes_by_price(&db)
        .await
        .unwrap()
        .dishes
        .iter()
        .map(|d| d.price)
        .collect();
    assert_eq!(prices, [250, 300, 500]);
}

#[tokio::test]
async fn test_get_dishes_by_veg() {
    let db = crate::seed::in_memory().await.unwrap();

    let veg = get_dishes_by_veg(&db, true).await.unwrap();
    assert_eq!(veg.dishes.len(), 2);
    assert!(veg.dishes.iter().all(|d| d.is_veg));

    let non_veg = get_dishes_by_veg(&db, false).await.unwrap();
    assert_eq!(non_veg.dishes.len(), 1);
    assert_eq!(non_veg.dishes[0].name, "Chicken Alfredo Pasta");

    assert_eq!(get_dishes(&db).await.unwrap().dishes.len(), 3);
    assert_eq!(get_dish_by_id(&db, 3).await.unwrap().dishes[0].price, 250);
}

#[tokio::test]
async fn test_empty_tables() {
    let db = crate::seed::empty_in_memory().await.unwrap();

    assert!(get_restaurants(&db).await.unwrap().is_empty());
    assert!(get_restaurants_by_rating(&db).await.unwrap().is_empty());
    assert!(get_dishes(&db).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_connect_rejects_unseeded_database() {
    assert!(connect("sqlite::memory:").await.is_err());
    assert!(connect("postgres://localhost/food").await.is_err());
}

#[tokio::test]
async fn test_connect_seeded_file_is_read_only() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("database.sqlite").display());

    let seeded = crate::seed::connect(&url).await.unwrap();
    crate::seed::create_schema(&seeded).await.unwrap();
    crate::seed::insert_fixtures(&seeded).await.unwrap();
    seeded.close().await;

    let db = connect(&url).await.unwrap();
    assert_eq!(get_restaurants(&db).await.unwrap().restaurants.len(), 3);
    assert_eq!(get_dishes(&db).await.unwrap().dishes.len(), 3);
    assert!(sqlx::query("DELETE FROM restaurants")
        .execute(&db)
        .await
        .is_err());
    assert_eq!(get_restaurants(&db).await.unwrap().restaurants.len(), 3);
}

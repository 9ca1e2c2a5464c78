use actix_web::{web, HttpResponse};
use restaurant_query::{data::parse_flag, db as db_api};
use sqlx::SqlitePool;

use crate::error::ApiError;

pub(super) struct ApiState {
    db_pool: SqlitePool,
}

impl ApiState {
    pub(super) async fn new(addr: &str) -> anyhow::Result<Self> {
        let db_pool = db_api::connect(addr).await?;
        Ok(Self { db_pool })
    }

    pub(super) fn from_pool(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }
}

type ApiResult = Result<HttpResponse, ApiError>;

/// Register every route along with the extractor error handlers.
pub(super) fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PathConfig::default().error_handler(|_, req| {
        let raw = req.match_info().get("id").unwrap_or_default();
        ApiError::BadRequest(format!("invalid id: {raw}")).into()
    }))
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| ApiError::BadRequest(err.to_string()).into()),
    )
    .service(restaurants)
    .service(restaurant_details)
    .service(restaurants_by_cuisine)
    .service(restaurants_filter)
    .service(restaurants_sort_by_rating)
    .service(dishes)
    .service(dish_details)
    .service(dishes_filter)
    .service(dishes_sort_by_price);
}

fn flag(param: &str, raw: Option<&str>) -> Result<bool, ApiError> {
    let Some(raw) = raw else {
        return Err(ApiError::BadRequest(format!("missing query parameter {param}")));
    };
    parse_flag(raw).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "invalid value for {param}: {raw:?}, expect one of true, false, 1, 0"
        ))
    })
}

#[actix_web::get("/restaurants")]
pub(super) async fn restaurants(data: web::Data<ApiState>) -> ApiResult {
    let result = db_api::get_restaurants(&data.db_pool).await?;
    if result.is_empty() {
        return Err(ApiError::NotFound("No restaurants found".to_string()));
    }
    Ok(HttpResponse::Ok().json(result))
}

#[derive(serde::Deserialize)]
pub(super) struct DetailsPath {
    id: i64,
}

#[actix_web::get("/restaurants/details/{id}")]
pub(super) async fn restaurant_details(
    data: web::Data<ApiState>,
    path: web::Path<DetailsPath>,
) -> ApiResult {
    let result = db_api::get_restaurant_by_id(&data.db_pool, path.id).await?;
    if result.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No restaurant found by id: {}",
            path.id
        )));
    }
    Ok(HttpResponse::Ok().json(result))
}

#[actix_web::get("/restaurants/cuisine/{cuisine}")]
pub(super) async fn restaurants_by_cuisine(
    data: web::Data<ApiState>,
    cuisine: web::Path<String>,
) -> ApiResult {
    let result = db_api::get_restaurants_by_cuisine(&data.db_pool, &cuisine).await?;
    if result.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No restaurants found offering {cuisine} cuisine"
        )));
    }
    Ok(HttpResponse::Ok().json(result))
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RestaurantFilterQuery {
    is_veg: Option<String>,
    has_outdoor_seating: Option<String>,
    is_luxury: Option<String>,
}

#[actix_web::get("/restaurants/filter")]
pub(super) async fn restaurants_filter(
    data: web::Data<ApiState>,
    query: web::Query<RestaurantFilterQuery>,
) -> ApiResult {
    let filter = db_api::FeatureFilter {
        is_veg: flag("isVeg", query.is_veg.as_deref())?,
        has_outdoor_seating: flag("hasOutdoorSeating", query.has_outdoor_seating.as_deref())?,
        is_luxury: flag("isLuxury", query.is_luxury.as_deref())?,
    };

    let result = db_api::get_restaurants_by_features(&data.db_pool, filter).await?;
    if result.is_empty() {
        return Err(ApiError::NotFound("No such restaurant found".to_string()));
    }
    Ok(HttpResponse::Ok().json(result))
}

#[actix_web::get("/restaurants/sort-by-rating")]
pub(super) async fn restaurants_sort_by_rating(data: web::Data<ApiState>) -> ApiResult {
    let result = db_api::get_restaurants_by_rating(&data.db_pool).await?;
    if result.is_empty() {
        return Err(ApiError::NotFound(
            "No restaurants found ordered by rating high to low".to_string(),
        ));
    }
    Ok(HttpResponse::Ok().json(result))
}

#[actix_web::get("/dishes")]
pub(super) async fn dishes(data: web::Data<ApiState>) -> ApiResult {
    let result = db_api::get_dishes(&data.db_pool).await?;
    if result.is_empty() {
        return Err(ApiError::NotFound("No dishes found".to_string()));
    }
    Ok(HttpResponse::Ok().json(result))
}

#[actix_web::get("/dishes/details/{id}")]
pub(super) async fn dish_details(
    data: web::Data<ApiState>,
    path: web::Path<DetailsPath>,
) -> ApiResult {
    let result = db_api::get_dish_by_id(&data.db_pool, path.id).await?;
    if result.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No dish found by id: {}",
            path.id
        )));
    }
    Ok(HttpResponse::Ok().json(result))
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DishFilterQuery {
    is_veg: Option<String>,
}

#[actix_web::get("/dishes/filter")]
pub(super) async fn dishes_filter(
    data: web::Data<ApiState>,
    query: web::Query<DishFilterQuery>,
) -> ApiResult {
    let is_veg = flag("isVeg", query.is_veg.as_deref())?;
    let result = db_api::get_dishes_by_veg(&data.db_pool, is_veg).await?;
    if result.is_empty() {
        return Err(ApiError::NotFound("No such dishes found".to_string()));
    }
    Ok(HttpResponse::Ok().json(result))
}

#[actix_web::get("/dishes/sort-by-price")]
pub(super) async fn dishes_sort_by_price(data: web::Data<ApiState>) -> ApiResult {
    let result = db_api::get_dishes_by_price(&data.db_pool).await?;
    if result.is_empty() {
        return Err(ApiError::NotFound(
            "No dishes found with price low to high".to_string(),
        ));
    }
    Ok(HttpResponse::Ok().json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use restaurant_query::seed;
    use serde_json::Value;

    macro_rules! app {
        ($pool:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(ApiState::from_pool($pool)))
                    .configure(configure),
            )
            .await
        };
    }

    macro_rules! get {
        ($app:expr, $uri:expr) => {{
            let req = test::TestRequest::get().uri($uri).to_request();
            let resp = test::call_service(&$app, req).await;
            let status = resp.status();
            let body: Value = test::read_body_json(resp).await;
            (status, body)
        }};
    }

    fn names(body: &Value, field: &str) -> Vec<String> {
        body[field]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[actix_web::test]
    async fn test_list_all() {
        let app = app!(seed::in_memory().await.unwrap());

        let (status, body) = get!(app, "/restaurants");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            names(&body, "restaurants"),
            ["Spice Kitchen", "Olive Bistro", "Green Leaf"]
        );
        let first = &body["restaurants"][0];
        assert_eq!(first["id"], 1);
        assert_eq!(first["isVeg"], true);
        assert_eq!(first["priceForTwo"], 1500);
        assert_eq!(first["hasOutdoorSeating"], true);
        assert_eq!(first["isLuxury"], false);

        let (status, body) = get!(app, "/dishes");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dishes"].as_array().unwrap().len(), 3);
    }

    #[actix_web::test]
    async fn test_details_by_id() {
        let app = app!(seed::in_memory().await.unwrap());

        for id in 1..=3 {
            let (status, body) = get!(app, &format!("/restaurants/details/{id}"));
            assert_eq!(status, StatusCode::OK);
            let rests = body["restaurants"].as_array().unwrap();
            assert_eq!(rests.len(), 1);
            assert_eq!(rests[0]["id"], id);
        }

        let (status, body) = get!(app, "/dishes/details/2");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&body, "dishes"), ["Chicken Alfredo Pasta"]);

        let (status, body) = get!(app, "/restaurants/details/99");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "No restaurant found by id: 99");

        let (status, body) = get!(app, "/dishes/details/0");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "No dish found by id: 0");
    }

    #[actix_web::test]
    async fn test_malformed_id() {
        let app = app!(seed::in_memory().await.unwrap());

        let (status, body) = get!(app, "/restaurants/details/abc");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "invalid id: abc");

        let (status, _) = get!(app, "/dishes/details/99999999999999999999999");
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // the server keeps answering afterwards
        let (status, _) = get!(app, "/dishes/details/1");
        assert_eq!(status, StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_cuisine() {
        let app = app!(seed::in_memory().await.unwrap());

        let (status, body) = get!(app, "/restaurants/cuisine/Italian");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&body, "restaurants"), ["Olive Bistro"]);

        let (status, body) = get!(app, "/restaurants/cuisine/Mexican");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "No restaurants found offering Mexican cuisine");
    }

    #[actix_web::test]
    async fn test_restaurant_filter() {
        let app = app!(seed::in_memory().await.unwrap());

        let (status, body) = get!(
            app,
            "/restaurants/filter?isVeg=true&hasOutdoorSeating=true&isLuxury=false"
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&body, "restaurants"), ["Spice Kitchen"]);

        let (status, body) = get!(
            app,
            "/restaurants/filter?isVeg=0&hasOutdoorSeating=0&isLuxury=1"
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&body, "restaurants"), ["Olive Bistro"]);

        let (status, body) = get!(
            app,
            "/restaurants/filter?isVeg=false&hasOutdoorSeating=true&isLuxury=true"
        );
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "No such restaurant found");

        let (status, body) = get!(app, "/restaurants/filter?isVeg=true&isLuxury=false");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "missing query parameter hasOutdoorSeating");

        let (status, _) = get!(
            app,
            "/restaurants/filter?isVeg=yes&hasOutdoorSeating=true&isLuxury=false"
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_dish_filter() {
        let app = app!(seed::in_memory().await.unwrap());

        let (status, body) = get!(app, "/dishes/filter?isVeg=true");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            names(&body, "dishes"),
            ["Paneer Butter Masala", "Veg Hakka Noodles"]
        );

        let (status, body) = get!(app, "/dishes/filter?isVeg=0");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&body, "dishes"), ["Chicken Alfredo Pasta"]);

        let (status, _) = get!(app, "/dishes/filter");
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = get!(app, "/dishes/filter?isVeg=TRUE");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("isVeg"));
    }

    #[actix_web::test]
    async fn test_sorting() {
        let app = app!(seed::in_memory().await.unwrap());

        let (status, body) = get!(app, "/restaurants/sort-by-rating");
        assert_eq!(status, StatusCode::OK);
        let ratings: Vec<f64> = body["restaurants"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["rating"].as_f64().unwrap())
            .collect();
        assert_eq!(ratings.len(), 3);
        assert!(ratings.windows(2).all(|w| w[0] >= w[1]));

        let (status, body) = get!(app, "/dishes/sort-by-price");
        assert_eq!(status, StatusCode::OK);
        let prices: Vec<i64> = body["dishes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["price"].as_i64().unwrap())
            .collect();
        assert_eq!(prices.len(), 3);
        assert!(prices.windows(2).all(|w| w[0] <= w[1]));
    }

    #[actix_web::test]
    async fn test_sorting_small_tables() {
        let pool = seed::empty_in_memory().await.unwrap();
        let app = app!(pool.clone());

        let (status, body) = get!(app, "/restaurants/sort-by-rating");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body["message"],
            "No restaurants found ordered by rating high to low"
        );
        let (status, body) = get!(app, "/dishes/sort-by-price");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "No dishes found with price low to high");
        let (status, _) = get!(app, "/restaurants");
        assert_eq!(status, StatusCode::NOT_FOUND);

        seed::add_restaurant(&pool, &seed::RESTAURANTS[2]).await.unwrap();
        let (status, body) = get!(app, "/restaurants/sort-by-rating");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&body, "restaurants"), ["Green Leaf"]);
    }

    #[actix_web::test]
    async fn test_storage_failure() {
        let pool = seed::in_memory().await.unwrap();
        sqlx::query("DROP TABLE dishes")
            .execute(&pool)
            .await
            .unwrap();
        let app = app!(pool);

        let (status, body) = get!(app, "/dishes");
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("no such table"));

        // restaurants are unaffected
        let (status, _) = get!(app, "/restaurants");
        assert_eq!(status, StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_concurrent_requests() {
        let app = app!(seed::in_memory().await.unwrap());

        let (rating, price, cuisine) = tokio::join!(
            test::call_service(
                &app,
                test::TestRequest::get()
                    .uri("/restaurants/sort-by-rating")
                    .to_request()
            ),
            test::call_service(
                &app,
                test::TestRequest::get()
                    .uri("/dishes/sort-by-price")
                    .to_request()
            ),
            test::call_service(
                &app,
                test::TestRequest::get()
                    .uri("/restaurants/cuisine/Chinese")
                    .to_request()
            ),
        );

        let rating: Value = test::read_body_json(rating).await;
        assert_eq!(
            names(&rating, "restaurants"),
            ["Spice Kitchen", "Olive Bistro", "Green Leaf"]
        );
        let price: Value = test::read_body_json(price).await;
        assert_eq!(
            names(&price, "dishes"),
            ["Veg Hakka Noodles", "Paneer Butter Masala", "Chicken Alfredo Pasta"]
        );
        let cuisine: Value = test::read_body_json(cuisine).await;
        assert_eq!(names(&cuisine, "restaurants"), ["Green Leaf"]);
    }
}

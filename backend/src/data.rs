use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub cuisine: String,
    pub is_veg: bool,
    pub rating: f64,
    pub price_for_two: i64,
    pub location: String,
    pub has_outdoor_seating: bool,
    pub is_luxury: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct Dish {
    pub id: i64,
    pub name: String,
    pub is_veg: bool,
    pub rating: f64,
    pub price: i64,
}

/// Response body `{"restaurants": [...]}`
#[derive(Debug, Serialize)]
pub struct RestaurantList {
    pub restaurants: Vec<Restaurant>,
}

impl RestaurantList {
    pub fn is_empty(&self) -> bool {
        self.restaurants.is_empty()
    }
}

/// Response body `{"dishes": [...]}`
#[derive(Debug, Serialize)]
pub struct DishList {
    pub dishes: Vec<Dish>,
}

impl DishList {
    pub fn is_empty(&self) -> bool {
        self.dishes.is_empty()
    }
}

/// Parse a boolean query value. Only `true`, `false`, `1` and `0` are accepted,
/// everything else (including `TRUE` or `yes`) is rejected.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

#[test]
fn test_parse_flag() {
    assert_eq!(parse_flag("true"), Some(true));
    assert_eq!(parse_flag("1"), Some(true));
    assert_eq!(parse_flag("false"), Some(false));
    assert_eq!(parse_flag("0"), Some(false));

    for raw in ["", "TRUE", "yes", "2", " true", "null"] {
        assert_eq!(parse_flag(raw), None, "{raw:?} should be rejected");
    }
}

#[test]
fn test_serialize_camel_case() {
    let list = DishList {
        dishes: vec![Dish {
            id: 1,
            name: "Veg Hakka Noodles".to_string(),
            is_veg: true,
            rating: 4.3,
            price: 250,
        }],
    };
    let json = serde_json::to_value(&list).unwrap();
    assert_eq!(json["dishes"][0]["isVeg"], true);
    assert_eq!(json["dishes"][0]["price"], 250);
}

//! Handle database requests.

use sqlx::{Pool, Postgres};

use crate::error::Result;
use crate::menu::{Dish, NewDish};

#[derive(Clone)]
pub struct DishRepository {
    pool: Pool<Postgres>,
}

impl DishRepository {
    /// Create a new [`DishRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a dish and return the stored row.
    pub async fn insert(&self, restaurant_id: &str, new: NewDish) -> Result<Dish> {
        let dish = Dish {
            id: crate::id::generate(),
            restaurant_id: restaurant_id.to_owned(),
            name: new.name,
            description: new.description,
            price: new.price,
            image: new.image,
            created_at: chrono::Utc::now(),
        };

        sqlx::query(
            r#"INSERT INTO dishes (id, restaurant_id, name, description, price, image, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(&dish.id)
        .bind(&dish.restaurant_id)
        .bind(&dish.name)
        .bind(&dish.description)
        .bind(dish.price)
        .bind(&dish.image)
        .bind(dish.created_at)
        .execute(&self.pool)
        .await?;

        Ok(dish)
    }

    /// List every dish of a restaurant, oldest first.
    pub async fn list_by_restaurant(&self, restaurant_id: &str) -> Result<Vec<Dish>> {
        let dishes = sqlx::query_as::<_, Dish>(
            r#"SELECT id, restaurant_id, name, description, price, image, created_at
                FROM dishes
                WHERE restaurant_id = $1
                ORDER BY created_at"#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(dishes)
    }
}

//! Seed the demo restaurant.
//!
//! The demo restaurant has no manager and no waiter; every signed-in user
//! can browse it and only the admin manages it. Seeding is idempotent:
//! if a demo restaurant already exists, nothing is written.

use tablecraft_server::db::{
    CategoryRepository, NewRestaurant, ProductInput, ProductRepository, RestaurantRepository,
    SectionRepository,
};

use super::CommandError;

/// Create the demo restaurant with a small sample menu.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is missing or a write fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    let restaurants = RestaurantRepository::new(&pool);
    if let Some(existing) = restaurants.demo().await? {
        tracing::info!(restaurant_id = existing.id.as_i32(), "Demo restaurant already exists");
        return Ok(());
    }

    let restaurant = restaurants
        .create(&NewRestaurant {
            name: "Demo Bistro".to_owned(),
            concept: Some(
                "A small European bistro used to demonstrate the menu system.".to_owned(),
            ),
            manager_id: None,
        })
        .await?;
    tracing::info!(restaurant_id = restaurant.id.as_i32(), "Created demo restaurant");

    let sections = SectionRepository::new(&pool);
    let categories = CategoryRepository::new(&pool);
    let products = ProductRepository::new(&pool);

    let kitchen = sections
        .create(restaurant.id, "Kitchen", Some("Dishes from the kitchen"))
        .await?;
    let bar = sections
        .create(restaurant.id, "Bar", Some("Drinks and cocktails"))
        .await?;

    let starters = categories
        .create(kitchen.id, restaurant.id, "Starters", Some("To begin with"))
        .await?;
    let mains = categories
        .create(kitchen.id, restaurant.id, "Main courses", None)
        .await?;
    let wine = categories
        .create(bar.id, restaurant.id, "Wine", Some("By the glass"))
        .await?;

    products
        .create(
            starters.id,
            restaurant.id,
            &ProductInput {
                title: "Onion soup".to_owned(),
                weight: Some("300 g".to_owned()),
                ingredients: "Onion, beef broth, baguette, gruyere".to_owned(),
                allergens: Some("Gluten, milk".to_owned()),
                description: Some("Slow-cooked onions under a gratinated crust.".to_owned()),
                features: None,
                table_setting: Some("Lion's head bowl, soup spoon".to_owned()),
                gastronomic_pairings: Some("Dry sherry".to_owned()),
                image_path: None,
            },
        )
        .await?;

    products
        .create(
            mains.id,
            restaurant.id,
            &ProductInput {
                title: "Steak frites".to_owned(),
                weight: Some("180/150 g".to_owned()),
                ingredients: "Flank steak, potatoes, herb butter".to_owned(),
                allergens: Some("Milk".to_owned()),
                description: Some("Served medium unless asked otherwise.".to_owned()),
                features: Some("Signature dish".to_owned()),
                table_setting: Some("Steak knife on the right".to_owned()),
                gastronomic_pairings: Some("Malbec, a glass of house red".to_owned()),
                image_path: None,
            },
        )
        .await?;

    products
        .create(
            wine.id,
            restaurant.id,
            &ProductInput {
                title: "House red".to_owned(),
                weight: Some("150 ml".to_owned()),
                ingredients: "Merlot blend".to_owned(),
                allergens: Some("Sulphites".to_owned()),
                description: None,
                features: None,
                table_setting: Some("Bordeaux glass".to_owned()),
                gastronomic_pairings: Some("Red meat, hard cheese".to_owned()),
                image_path: None,
            },
        )
        .await?;

    tracing::info!("Demo restaurant seeded");
    Ok(())
}

//! Runs against a real PostgreSQL server; set `DATABASE_URL` and run with
//! `--ignored`.

use chrono::{Datelike, Duration, NaiveDate, SubsecRound, TimeZone, Utc};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use sqlx::PgPool;

use compucie_db::{
    model::Product, BirthdayDb, DbError, PinDb, ProductDb, PurchaseDb, PurchaseItemDb, RfidDb, SqlExecutor,
};

fn new_card_id() -> String {
    thread_rng().sample_iter(&Alphanumeric).take(14).map(char::from).collect()
}

mod pins {
    use super::*;

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn currently_pinned(pool: PgPool) {
        let pins = PinDb::new(SqlExecutor::new(pool));
        let now = Utc::now();
        pins.insert_pin(1, Some(now - Duration::hours(1)), Some(now + Duration::hours(1))).await.unwrap();
        pins.insert_pin(2, Some(now - Duration::hours(1)), None).await.unwrap();
        pins.insert_pin(3, Some(now + Duration::hours(1)), None).await.unwrap();
        pins.insert_pin(4, Some(now - Duration::hours(2)), Some(now - Duration::hours(1))).await.unwrap();

        let mut pinned = pins.get_currently_pinned_event_ids().await.unwrap();
        pinned.sort();

        assert_eq!(pinned, vec!(1, 2));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn start_defaults_to_now(pool: PgPool) {
        let pins = PinDb::new(SqlExecutor::new(pool));
        let before = Utc::now().trunc_subsecs(6);

        let pin_id = pins.insert_pin(5, None, None).await.unwrap();

        let pin = pins.get_pin(pin_id).await.unwrap();
        assert_eq!(pin.event_id, 5);
        assert!(pin.start_at >= before);
        assert_eq!(pin.end_at, None);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn update_and_delete(pool: PgPool) {
        let pins = PinDb::new(SqlExecutor::new(pool));
        let now = Utc::now();
        let pin_id = pins.insert_pin(6, Some(now - Duration::hours(1)), None).await.unwrap();

        assert!(pins.update_pin(6, Some(now + Duration::days(1)), None).await.unwrap());
        assert!(!pins.get_currently_pinned_event_ids().await.unwrap().contains(&6));
        assert!(!pins.update_pin(7, None, None).await.unwrap());

        assert!(pins.delete_pin(pin_id).await.unwrap());
        assert!(pins.get_pin(pin_id).await.unwrap_err().is_not_found());
    }
}

mod rfid {
    use super::*;

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn registration_and_activation(pool: PgPool) {
        let cards = RfidDb::new(SqlExecutor::new(pool));
        let card_id = new_card_id();
        let valid_until = (Utc::now() + Duration::days(1)).trunc_subsecs(0);

        assert!(!cards.is_rfid_card_registered(&card_id).await.unwrap());
        assert_eq!(cards.insert_rfid(&card_id, 42, "hashed", valid_until, false).await.unwrap(), card_id);

        assert!(cards.is_rfid_card_registered(&card_id).await.unwrap());
        assert!(!cards.is_rfid_card_activated(&card_id).await.unwrap());
        assert_eq!(cards.get_congressus_member_id_from_card_id(&card_id).await.unwrap(), 42);
        let token = cards.get_activation_token_info(&card_id).await.unwrap();
        assert_eq!(token.hashed_activation_token, "hashed");
        assert_eq!(token.activation_token_valid_until, valid_until);

        assert!(cards.activate_card(&card_id).await.unwrap());

        assert!(cards.is_rfid_card_activated(&card_id).await.unwrap());
        assert!(cards.get_activation_token_info(&card_id).await.unwrap_err().is_not_found());
        assert!(cards.update_last_used_at(&card_id).await.unwrap());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn unknown_card(pool: PgPool) {
        let cards = RfidDb::new(SqlExecutor::new(pool));
        let card_id = new_card_id();

        let error = cards.get_congressus_member_id_from_card_id(&card_id).await.unwrap_err();
        assert!(matches!(error, DbError::NotFound { entity: "card", .. }));
        let error = cards.get_activation_token_info(&card_id).await.unwrap_err();
        assert!(matches!(error, DbError::NotFound { entity: "activation token", .. }));
        assert!(!cards.activate_card(&card_id).await.unwrap());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn member_zero_is_not_registered(pool: PgPool) {
        let cards = RfidDb::new(SqlExecutor::new(pool));
        let card_id = new_card_id();
        cards.insert_rfid(&card_id, 0, "hashed", Utc::now(), false).await.unwrap();

        assert!(cards.get_congressus_member_id_from_card_id(&card_id).await.unwrap_err().is_not_found());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn registering_twice_is_a_duplicate(pool: PgPool) {
        let cards = RfidDb::new(SqlExecutor::new(pool));
        let card_id = new_card_id();
        cards.insert_rfid(&card_id, 1, "hashed", Utc::now(), false).await.unwrap();

        let error = cards.insert_rfid(&card_id, 2, "hashed", Utc::now(), false)
            .await
            .expect_err("Should fail when registering a card twice");
        assert!(error.is_duplicate());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn overlong_card_id_is_invalid(pool: PgPool) {
        let cards = RfidDb::new(SqlExecutor::new(pool));
        let card_id = format!("{}X", new_card_id());

        let error = cards.insert_rfid(&card_id, 1, "hashed", Utc::now(), false)
            .await
            .expect_err("Should fail when the card id does not fit the column");
        assert!(matches!(error, DbError::InvalidArgument(_)));
        assert!(!cards.is_rfid_card_registered(&card_id).await.unwrap());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn deleting_registrations(pool: PgPool) {
        let cards = RfidDb::new(SqlExecutor::new(pool));
        let activated = new_card_id();
        let pending = new_card_id();
        cards.insert_rfid(&activated, 9, "a", Utc::now(), true).await.unwrap();
        cards.insert_rfid(&pending, 9, "b", Utc::now(), false).await.unwrap();

        assert!(cards.delete_members_activated_registrations(9).await.unwrap());
        assert!(!cards.is_rfid_card_registered(&activated).await.unwrap());
        assert!(cards.is_rfid_card_registered(&pending).await.unwrap());
        assert!(!cards.delete_members_activated_registrations(9).await.unwrap());

        assert!(cards.delete_members_rfid_registrations(9).await.unwrap());
        assert!(!cards.is_rfid_card_registered(&pending).await.unwrap());
    }
}

mod birthdays {
    use super::*;

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn birthday_today(pool: PgPool) {
        let db = SqlExecutor::new(pool);
        let birthdays = BirthdayDb::new(db.clone());
        let (today,): (NaiveDate,) = db.read_one("SELECT CURRENT_DATE", vec!())
            .await
            .unwrap()
            .unwrap();
        // leap years, so February 29th exists
        let born = NaiveDate::from_ymd_opt(2000, today.month(), today.day()).unwrap();
        let not_today = today.checked_add_signed(Duration::days(2)).unwrap();

        let id = birthdays.insert_birthday(11, born).await.unwrap();
        birthdays.insert_birthday(12, NaiveDate::from_ymd_opt(2004, not_today.month(), not_today.day()).unwrap())
            .await
            .unwrap();

        assert_eq!(birthdays.get_member_ids_with_birthday_today().await.unwrap(), vec!(11));
        assert_eq!(birthdays.get_birthday(id).await.unwrap().date_of_birth, born);
        assert!(birthdays.delete_birthday(id).await.unwrap());
        assert!(birthdays.get_member_ids_with_birthday_today().await.unwrap().is_empty());
    }
}

mod sales {
    use super::*;

    fn product(id: i64, name: &str, unit_price_cents: Option<i64>) -> Product {
        Product { id, name: name.to_owned(), unit_price_cents }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn upserting_products(pool: PgPool) {
        let products = ProductDb::new(SqlExecutor::new(pool));
        products.upsert_products(&[product(1, "Cola", Some(120)), product(2, "Mars", None)]).await.unwrap();
        products.upsert_products(&[product(1, "Cola Zero", Some(95))]).await.unwrap();

        assert_eq!(products.get_product(1).await.unwrap(), product(1, "Cola Zero", Some(95)));
        assert_eq!(products.get_products().await.unwrap(), vec!(
            product(1, "Cola Zero", Some(95)),
            product(2, "Mars", None),
        ));
        assert!(products.get_product(3).await.unwrap_err().is_not_found());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn failed_upsert_rolls_back(pool: PgPool) {
        let products = ProductDb::new(SqlExecutor::new(pool));
        products.upsert_products(&[product(1, "Cola", Some(120))]).await.unwrap();

        // NUMERIC(10, 2) overflows on the second product
        let error = products.upsert_products(&[
            product(1, "Cola Zero", Some(95)),
            product(2, "Gold bar", Some(10_000_000_000_000)),
        ]).await.expect_err("Should fail on the price overflow");
        assert!(matches!(error, DbError::InvalidArgument(_)));

        assert_eq!(products.get_products().await.unwrap(), vec!(product(1, "Cola", Some(120))));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn purchases_and_items(pool: PgPool) {
        let db = SqlExecutor::new(pool);
        let purchases = PurchaseDb::new(db.clone());
        let items = PurchaseItemDb::new(db);
        let purchased_at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();

        let purchase_id = purchases.add_purchase(Some(purchased_at), Some(215)).await.unwrap();
        let item_id = items.add_item(purchase_id, 1, 2, Some("Cola"), Some(95)).await.unwrap();
        items.add_item(purchase_id, 2, 1, None, None).await.unwrap();

        let purchase = purchases.get_purchase(purchase_id).await.unwrap();
        assert_eq!(purchase.purchased_at, Some(purchased_at));
        assert_eq!(purchase.price_cents, Some(215));

        let got = items.get_items(purchase_id).await.unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].id, item_id);
        assert_eq!(got[0].name.as_deref(), Some("Cola"));
        assert_eq!(got[0].unit_price_cents, Some(95));
        assert_eq!(got[1].name, None);
        assert_eq!(got[1].unit_price_cents, None);

        assert!(purchases.delete_purchase(purchase_id).await.unwrap());
        assert!(items.get_items(purchase_id).await.unwrap().is_empty());
        assert!(purchases.get_purchase(purchase_id).await.unwrap_err().is_not_found());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn purchase_defaults_to_now(pool: PgPool) {
        let purchases = PurchaseDb::new(SqlExecutor::new(pool));

        let purchase_id = purchases.add_purchase(None, None).await.unwrap();

        let purchase = purchases.get_purchase(purchase_id).await.unwrap();
        assert!(purchase.purchased_at.is_some());
        assert_eq!(purchase.price_cents, None);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn product_sales_per_weekday(pool: PgPool) {
        let db = SqlExecutor::new(pool);
        let purchases = PurchaseDb::new(db.clone());
        let items = PurchaseItemDb::new(db);
        // ISO week 10 of 2024 runs from Monday the 4th to Sunday the 10th of March
        let tuesday = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        let sunday = Utc.with_ymd_and_hms(2024, 3, 10, 23, 0, 0).unwrap();
        let next_monday = Utc.with_ymd_and_hms(2024, 3, 11, 9, 0, 0).unwrap();

        for (purchased_at, product_id, quantity) in [
            (tuesday, 1, 2),
            (tuesday, 1, 1),
            (sunday, 1, 4),
            (sunday, 2, 1),
            (next_monday, 1, 10),
        ] {
            let purchase_id = purchases.add_purchase(Some(purchased_at), None).await.unwrap();
            items.add_item(purchase_id, product_id, quantity, Some("Snack"), Some(100)).await.unwrap();
        }

        let sales = items.get_product_sales(2024, 10).await.unwrap();

        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].product_id, 1);
        assert_eq!(sales[0].quantity_on(1), 3);
        assert_eq!(sales[0].quantity_on(6), 4);
        assert_eq!(sales[0].total_quantity(), 7);
        assert_eq!(sales[1].product_id, 2);
        assert_eq!(sales[1].total_quantity(), 1);
        assert_eq!(sales[1].entries[0].unit_price_cents, Some(100));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn item_for_missing_purchase_is_rejected(pool: PgPool) {
        let items = PurchaseItemDb::new(SqlExecutor::new(pool));

        let error = items.add_item(999, 1, 1, None, None).await.unwrap_err();

        assert!(error.is_constraint_violation());
    }
}

use super::*;
use serde_json::json;

fn item_payload() -> ItemDto {
    serde_json::from_value(json!({
        "sku": "SKU1",
        "name": "Item 1",
        "category": {"name": "Test Category"},
        "tags": [{"name": "Tag 1"}, {"name": "Tag 2"}],
        "in_stock": true,
        "available_stock": "10.00"
    }))
    .unwrap()
}

#[test]
fn test_category_dto_requires_name() {
    let errors = CategoryDto::default().validate_create().unwrap_err();
    assert_eq!(errors["name"], vec!["This field is required.".to_string()]);

    // A partial update may leave the name out entirely
    assert_eq!(CategoryDto::default().validate_update().unwrap(), None);
}

#[test]
fn test_category_dto_trims_and_rejects_blank() {
    let dto = CategoryDto { name: Some("  Hardware  ".to_string()) };
    assert_eq!(dto.validate_create().unwrap(), "Hardware");

    let dto = CategoryDto { name: Some("   ".to_string()) };
    let errors = dto.validate_update().unwrap_err();
    assert_eq!(errors["name"], vec!["This field may not be blank.".to_string()]);
}

#[test]
fn test_tag_dto_enforces_max_length() {
    let dto = TagDto { name: Some("x".repeat(TAG_NAME_MAX + 1)) };
    let errors = dto.validate_create().unwrap_err();
    assert_eq!(
        errors["name"],
        vec!["Ensure this field has no more than 100 characters.".to_string()]
    );

    let dto = TagDto { name: Some("x".repeat(TAG_NAME_MAX)) };
    assert!(dto.validate_create().is_ok());
}

#[test]
fn test_item_validate_create_happy_path() {
    let input = item_payload().validate_create().unwrap();
    assert_eq!(input.sku, "SKU1");
    assert_eq!(input.name, "Item 1");
    assert_eq!(input.category_name, "Test Category");
    assert_eq!(input.tag_names, vec!["Tag 1".to_string(), "Tag 2".to_string()]);
    assert!(input.in_stock);
    assert_eq!(input.available_stock, Quantity::from_units(10));
}

#[test]
fn test_item_validate_create_defaults_in_stock() {
    let mut dto = item_payload();
    dto.in_stock = None;
    assert!(dto.validate_create().unwrap().in_stock);
}

#[test]
fn test_item_validate_create_accepts_numeric_stock() {
    let mut dto = item_payload();
    dto.available_stock = Some(json!(2.5));
    assert_eq!(dto.validate_create().unwrap().available_stock.to_string(), "2.50");
}

#[test]
fn test_item_validate_create_reports_every_missing_field() {
    let errors = ItemDto::default().validate_create().unwrap_err();
    for field in ["sku", "name", "category", "tags", "available_stock"] {
        assert_eq!(errors[field], vec!["This field is required.".to_string()], "field {}", field);
    }
    assert!(!errors.contains_key("in_stock"));
}

#[test]
fn test_item_validate_nested_error_keys() {
    let mut dto = item_payload();
    dto.category = Some(NamedRefDto { id: Some(1), name: None });
    dto.tags = Some(vec![NamedRefDto::named("ok"), NamedRefDto::named("  ")]);

    let errors = dto.validate_create().unwrap_err();
    assert_eq!(errors["category.name"], vec!["This field is required.".to_string()]);
    assert_eq!(errors["tags[1].name"], vec!["This field may not be blank.".to_string()]);
    assert!(!errors.contains_key("tags[0].name"));
}

#[test]
fn test_item_validate_rejects_bad_stock() {
    let mut dto = item_payload();
    dto.available_stock = Some(json!("-1"));
    let errors = dto.validate_create().unwrap_err();
    assert_eq!(
        errors["available_stock"],
        vec!["Ensure this value is greater than or equal to 0.".to_string()]
    );

    dto.available_stock = Some(json!("abc"));
    let errors = dto.validate_create().unwrap_err();
    assert_eq!(errors["available_stock"], vec!["A valid number is required.".to_string()]);

    dto.available_stock = Some(json!(true));
    assert!(dto.validate_create().is_err());
}

#[test]
fn test_item_validate_update_partial_accepts_subset() {
    let dto: ItemDto = serde_json::from_value(json!({"in_stock": false})).unwrap();
    let changes = dto.validate_update(true).unwrap();
    assert_eq!(
        changes,
        ItemChanges { in_stock: Some(false), ..ItemChanges::default() }
    );
}

#[test]
fn test_item_validate_update_full_requires_fields() {
    let dto: ItemDto = serde_json::from_value(json!({"in_stock": false})).unwrap();
    let errors = dto.validate_update(false).unwrap_err();
    assert!(errors.contains_key("sku"));
    assert!(errors.contains_key("category"));
}

#[test]
fn test_item_validate_update_empty_tag_list_clears_tags() {
    let dto: ItemDto = serde_json::from_value(json!({"tags": []})).unwrap();
    let changes = dto.validate_update(true).unwrap();
    assert_eq!(changes.tag_names, Some(vec![]));
}

#[test]
fn test_item_dto_serialization_skips_absent_fields() {
    let dto = ItemDto { name: Some("Widget".to_string()), ..ItemDto::default() };
    assert_eq!(serde_json::to_value(&dto).unwrap(), json!({"name": "Widget"}));
}

#[test]
fn test_item_list_query_parses_ordering_and_category() {
    let query = ItemListQuery {
        search: Some("Widget".to_string()),
        category: Some("3".to_string()),
        ordering: Some("-available_stock".to_string()),
    };
    let filter = query.validate().unwrap();
    assert_eq!(filter.name.as_deref(), Some("Widget"));
    assert_eq!(filter.category_id, Some(3));
    assert_eq!(
        filter.ordering,
        Some(Ordering { field: ItemSortField::AvailableStock, descending: true })
    );
}

#[test]
fn test_item_list_query_empty_values_mean_unfiltered() {
    let query = ItemListQuery {
        search: Some(String::new()),
        category: Some(String::new()),
        ordering: Some(String::new()),
    };
    assert_eq!(query.validate().unwrap(), ItemFilter::default());
}

#[test]
fn test_item_list_query_rejects_unknown_values() {
    let query = ItemListQuery {
        search: None,
        category: Some("abc".to_string()),
        ordering: Some("price".to_string()),
    };
    let errors = query.validate().unwrap_err();
    assert_eq!(errors["category"], vec!["A valid integer is required.".to_string()]);
    assert_eq!(errors["ordering"], vec!["Cannot order by unknown field \"price\".".to_string()]);
}

#[test]
fn test_category_list_query() {
    let query = CategoryListQuery { search: Some("ware".to_string()), ordering: Some("name".to_string()) };
    let filter = query.validate().unwrap();
    assert_eq!(filter.search.as_deref(), Some("ware"));
    assert_eq!(filter.ordering, Some(Ordering { field: CategorySortField::Name, descending: false }));

    let query = CategoryListQuery { search: None, ordering: Some("-sku".to_string()) };
    assert!(query.validate().is_err());
}

#[test]
fn test_register_validate() {
    let dto = RegisterDto {
        username: Some("alice".to_string()),
        email: Some("Alice@Example.COM".to_string()),
        password: Some("s3cure-passphrase".to_string()),
    };
    let account = dto.validate().unwrap();
    assert_eq!(account.username, "alice");
    assert_eq!(account.email, "Alice@example.com");
}

#[test]
fn test_register_validate_collects_errors() {
    let dto = RegisterDto {
        username: Some("bad name!".to_string()),
        email: Some("not-an-email".to_string()),
        password: Some("1234".to_string()),
    };
    let errors = dto.validate().unwrap_err();
    assert!(errors["username"][0].starts_with("Enter a valid username."));
    assert_eq!(errors["email"], vec!["Enter a valid email address.".to_string()]);
    assert_eq!(errors["password"].len(), 2);
}

#[test]
fn test_register_rejects_password_equal_to_username() {
    let dto = RegisterDto {
        username: Some("longusername".to_string()),
        email: Some("someone@example.com".to_string()),
        password: Some("LongUsername".to_string()),
    };
    let errors = dto.validate().unwrap_err();
    assert_eq!(
        errors["password"],
        vec!["The password is too similar to the username.".to_string()]
    );
}

#[test]
fn test_login_validate_detects_email() {
    let dto = LoginDto { username: Some("alice@Example.com".to_string()), password: Some("pw".to_string()) };
    let (identifier, password) = dto.validate().unwrap();
    assert_eq!(identifier, LoginIdentifier::Email("alice@example.com".to_string()));
    assert_eq!(password, "pw");

    let dto = LoginDto { username: Some("alice".to_string()), password: Some("pw".to_string()) };
    assert_eq!(dto.validate().unwrap().0, LoginIdentifier::Username("alice".to_string()));

    let errors = LoginDto::default().validate().unwrap_err();
    assert!(errors.contains_key("username"));
    assert!(errors.contains_key("password"));
}

#[test]
fn test_password_reset_request_validate() {
    let dto = PasswordResetRequestDto { email: Some("bob@example.com".to_string()) };
    assert_eq!(dto.validate().unwrap(), "bob@example.com");

    let errors = PasswordResetRequestDto::default().validate().unwrap_err();
    assert_eq!(errors["email"], vec!["This field is required.".to_string()]);
}

#[test]
fn test_password_reset_confirm_mismatch() {
    let dto = PasswordResetConfirmDto {
        email: Some("bob@example.com".to_string()),
        token: Some("abc".to_string()),
        new_password: Some("s3cure-passphrase".to_string()),
        new_password_confirm: Some("s3cure-passphrasf".to_string()),
    };
    let errors = dto.validate().unwrap_err();
    assert_eq!(
        errors["new_password_confirm"],
        vec!["Password fields didn't match.".to_string()]
    );
}

#[test]
fn test_password_reset_confirm_validate() {
    let dto = PasswordResetConfirmDto {
        email: Some("bob@example.com".to_string()),
        token: Some(" abc ".to_string()),
        new_password: Some("s3cure-passphrase".to_string()),
        new_password_confirm: Some("s3cure-passphrase".to_string()),
    };
    let reset = dto.validate().unwrap();
    assert_eq!(reset.token, "abc");
    assert_eq!(reset.new_password, "s3cure-passphrase");
}

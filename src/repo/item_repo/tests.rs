use super::*;
use crate::repo::{create_category, create_tag, delete_category, delete_tag, get_tag, list_tags};
use crate::test_utils::setup_test_db;

fn new_item(sku: &str, name: &str, category: &str, tags: &[&str], stock: u32) -> NewItemInput {
    NewItemInput {
        sku: sku.to_string(),
        name: name.to_string(),
        category_name: category.to_string(),
        tag_names: tags.iter().map(|t| t.to_string()).collect(),
        in_stock: true,
        available_stock: Quantity::from_units(stock),
    }
}

fn names(items: &[Item]) -> Vec<String> {
    items.iter().map(Item::get_name).collect()
}

#[test]
fn test_create_item() {
    let pool = setup_test_db();
    let category = create_category(&pool, "Test Category").unwrap();

    let item = create_item(&pool, &new_item("SKU1", "Item 1", "Test Category", &["Tag 1"], 10)).unwrap();

    assert_eq!(item.get_sku(), "SKU1");
    assert_eq!(item.get_category(), &category);
    assert_eq!(item.get_tags().len(), 1);
    assert_eq!(item.get_tags()[0].get_name(), "Tag 1");
    assert_eq!(item.get_available_stock().to_string(), "10.00");

    assert_eq!(get_item(&pool, item.get_id()).unwrap(), Some(item));
}

#[test]
fn test_create_item_reuses_existing_tags() {
    let pool = setup_test_db();
    create_category(&pool, "Test Category").unwrap();
    let existing = create_tag(&pool, "Tag 1").unwrap();

    let item = create_item(&pool, &new_item("SKU1", "Item 1", "Test Category", &["Tag 1", "Tag 2"], 1)).unwrap();

    assert_eq!(item.get_tags()[0], existing);
    assert_eq!(list_tags(&pool, None).unwrap().len(), 2);
}

#[test]
fn test_create_item_links_repeated_tag_once() {
    let pool = setup_test_db();
    create_category(&pool, "Test Category").unwrap();

    let item = create_item(&pool, &new_item("SKU1", "Item 1", "Test Category", &["Tag 1", "Tag 1"], 1)).unwrap();

    assert_eq!(item.get_tags().len(), 1);
}

#[test]
fn test_create_item_unknown_category_writes_nothing() {
    let pool = setup_test_db();

    let result = create_item(&pool, &new_item("SKU1", "Item 1", "Missing", &["Tag 1"], 1));

    assert!(matches!(result, Err(ItemWriteError::UnknownCategory(name)) if name == "Missing"));
    assert!(list_items(&pool, &ItemFilter::default()).unwrap().is_empty());
    assert!(list_tags(&pool, None).unwrap().is_empty());
}

#[test]
fn test_create_item_duplicate_sku_rolls_back_tags() {
    let pool = setup_test_db();
    create_category(&pool, "Test Category").unwrap();
    create_item(&pool, &new_item("SKU1", "Item 1", "Test Category", &[], 1)).unwrap();

    let result = create_item(&pool, &new_item("SKU1", "Other", "Test Category", &["Fresh"], 1));

    assert!(matches!(result, Err(ItemWriteError::DuplicateSku)));
    assert!(list_tags(&pool, None).unwrap().is_empty());
}

#[test]
fn test_list_items_filters() {
    let pool = setup_test_db();
    let category = create_category(&pool, "Test Category").unwrap();
    let other = create_category(&pool, "Other").unwrap();
    create_item(&pool, &new_item("SKU1", "Item 1", "Test Category", &["Tag 1"], 10)).unwrap();
    create_item(&pool, &new_item("SKU2", "Item 2", "Test Category", &["Tag 2"], 5)).unwrap();
    create_item(&pool, &new_item("SKU3", "Item 3", "Other", &[], 0)).unwrap();

    let all = list_items(&pool, &ItemFilter::default()).unwrap();
    assert_eq!(names(&all), vec!["Item 1", "Item 2", "Item 3"]);
    assert_eq!(all[0].get_tags()[0].get_name(), "Tag 1");
    assert!(all[2].get_tags().is_empty());

    let filter = ItemFilter { category_id: Some(category.get_id()), ..ItemFilter::default() };
    assert_eq!(names(&list_items(&pool, &filter).unwrap()), vec!["Item 1", "Item 2"]);

    let filter = ItemFilter { category_id: Some(other.get_id()), ..ItemFilter::default() };
    assert_eq!(names(&list_items(&pool, &filter).unwrap()), vec!["Item 3"]);

    let filter = ItemFilter { name: Some("item 1".to_string()), ..ItemFilter::default() };
    assert_eq!(names(&list_items(&pool, &filter).unwrap()), vec!["Item 1"]);

    // Exact match only
    let filter = ItemFilter { name: Some("Item".to_string()), ..ItemFilter::default() };
    assert!(list_items(&pool, &filter).unwrap().is_empty());
}

#[test]
fn test_list_items_ordering() {
    let pool = setup_test_db();
    create_category(&pool, "Test Category").unwrap();
    create_item(&pool, &new_item("B", "Banana", "Test Category", &[], 3)).unwrap();
    create_item(&pool, &new_item("C", "Apple", "Test Category", &[], 1)).unwrap();
    create_item(&pool, &new_item("A", "Cherry", "Test Category", &[], 2)).unwrap();

    let ordered = |field, descending| {
        let filter = ItemFilter { ordering: Some(Ordering { field, descending }), ..ItemFilter::default() };
        names(&list_items(&pool, &filter).unwrap())
    };

    assert_eq!(ordered(ItemSortField::Name, false), vec!["Apple", "Banana", "Cherry"]);
    assert_eq!(ordered(ItemSortField::Name, true), vec!["Cherry", "Banana", "Apple"]);
    assert_eq!(ordered(ItemSortField::Sku, false), vec!["Cherry", "Banana", "Apple"]);
    assert_eq!(ordered(ItemSortField::AvailableStock, true), vec!["Banana", "Cherry", "Apple"]);
    assert_eq!(ordered(ItemSortField::Id, true), vec!["Cherry", "Apple", "Banana"]);
}

#[test]
fn test_update_item_partial() {
    let pool = setup_test_db();
    create_category(&pool, "Test Category").unwrap();
    let item = create_item(&pool, &new_item("SKU1", "Item 1", "Test Category", &["Tag 1"], 10)).unwrap();

    let changes = ItemChanges { in_stock: Some(false), ..ItemChanges::default() };
    let updated = update_item(&pool, item.get_id(), &changes).unwrap().unwrap();

    assert!(!updated.get_in_stock());
    assert_eq!(updated.get_name(), "Item 1");
    assert_eq!(updated.get_tags(), item.get_tags());
}

#[test]
fn test_update_item_moves_category_and_replaces_tags() {
    let pool = setup_test_db();
    create_category(&pool, "Test Category").unwrap();
    let other = create_category(&pool, "Other").unwrap();
    let item = create_item(&pool, &new_item("SKU1", "Item 1", "Test Category", &["Tag 1", "Tag 2"], 10)).unwrap();

    let changes = ItemChanges {
        category_name: Some("Other".to_string()),
        tag_names: Some(vec!["Tag 3".to_string()]),
        ..ItemChanges::default()
    };
    let updated = update_item(&pool, item.get_id(), &changes).unwrap().unwrap();

    assert_eq!(updated.get_category(), &other);
    assert_eq!(updated.get_tags().len(), 1);
    assert_eq!(updated.get_tags()[0].get_name(), "Tag 3");
}

#[test]
fn test_update_item_errors() {
    let pool = setup_test_db();
    create_category(&pool, "Test Category").unwrap();
    create_item(&pool, &new_item("SKU1", "Item 1", "Test Category", &[], 1)).unwrap();
    let item = create_item(&pool, &new_item("SKU2", "Item 2", "Test Category", &[], 1)).unwrap();

    let changes = ItemChanges { sku: Some("SKU1".to_string()), ..ItemChanges::default() };
    assert!(matches!(update_item(&pool, item.get_id(), &changes), Err(ItemWriteError::DuplicateSku)));

    let changes = ItemChanges { category_name: Some("Missing".to_string()), ..ItemChanges::default() };
    assert!(matches!(
        update_item(&pool, item.get_id(), &changes),
        Err(ItemWriteError::UnknownCategory(_))
    ));

    let changes = ItemChanges { name: Some("Ghost".to_string()), ..ItemChanges::default() };
    assert!(update_item(&pool, 9999, &changes).unwrap().is_none());
}

#[test]
fn test_update_item_with_no_changes_returns_item() {
    let pool = setup_test_db();
    create_category(&pool, "Test Category").unwrap();
    let item = create_item(&pool, &new_item("SKU1", "Item 1", "Test Category", &[], 1)).unwrap();

    let updated = update_item(&pool, item.get_id(), &ItemChanges::default()).unwrap();
    assert_eq!(updated, Some(item));
}

#[test]
fn test_delete_item() {
    let pool = setup_test_db();
    create_category(&pool, "Test Category").unwrap();
    let item = create_item(&pool, &new_item("SKU1", "Item 1", "Test Category", &["Tag 1"], 1)).unwrap();

    assert!(delete_item(&pool, item.get_id()).unwrap());
    assert_eq!(get_item(&pool, item.get_id()).unwrap(), None);
    assert!(!delete_item(&pool, item.get_id()).unwrap());

    // The tag outlives the item
    assert!(get_tag(&pool, item.get_tags()[0].get_id()).unwrap().is_some());
}

#[test]
fn test_delete_category_cascades_to_items_not_tags() {
    let pool = setup_test_db();
    let category = create_category(&pool, "Test Category").unwrap();
    create_item(&pool, &new_item("SKU1", "Item 1", "Test Category", &["Tag 1"], 1)).unwrap();
    create_item(&pool, &new_item("SKU2", "Item 2", "Test Category", &["Tag 1"], 1)).unwrap();

    assert!(delete_category(&pool, category.get_id()).unwrap());

    assert!(list_items(&pool, &ItemFilter::default()).unwrap().is_empty());
    assert_eq!(list_tags(&pool, None).unwrap().len(), 1);
}

#[test]
fn test_delete_tag_unlinks_it_from_items() {
    let pool = setup_test_db();
    create_category(&pool, "Test Category").unwrap();
    let item = create_item(&pool, &new_item("SKU1", "Item 1", "Test Category", &["Tag 1", "Tag 2"], 1)).unwrap();

    assert!(delete_tag(&pool, item.get_tags()[0].get_id()).unwrap());

    let reloaded = get_item(&pool, item.get_id()).unwrap().unwrap();
    assert_eq!(reloaded.get_tags().len(), 1);
    assert_eq!(reloaded.get_tags()[0].get_name(), "Tag 2");
}

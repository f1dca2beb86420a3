//! Inventory, invoice, ledger, credit and user repositories.

use chrono::NaiveDate;
use hisaab_core::invoice::{CustomerDetails, GstInvoiceRequest, InvoiceLineRequest};
use hisaab_core::ledger::{
    CashFlowFilter, CashFlowInput, CreditTransactionInput, FlowDirection, InterestInput, PnlFilter,
    PnlInput, PnlKind, TransactionKind,
};
use hisaab_core::{CoreError, ItemInput, Money, Percentage, StockPolicy, DEFAULT_ACCOUNT_LIMIT};
use hisaab_db::{Database, DbConfig, DbError};

async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

fn item(code: &str, company: &str, sub_category: &str) -> ItemInput {
    ItemInput {
        code: code.to_string(),
        hsn_code: Some("8482".to_string()),
        company_name: company.to_string(),
        category: "Ball Bearing".to_string(),
        sub_category: sub_category.to_string(),
        quantity: Some(20),
        purchase_price: Money::from_rupees(80),
        selling_price_mrp: Money::from_rupees(118),
        gst_rate: Percentage::from_percent(18),
        rack_no: Some("R4".to_string()),
    }
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// =============================================================================
// Items
// =============================================================================

#[tokio::test]
async fn test_item_crud() {
    let db = setup().await;

    let created = db.items().create(&item("SKF-6203", "SKF", "6203")).await.unwrap();
    assert_eq!(created.quantity, 20);
    assert_eq!(created.gst_rate, Percentage::from_percent(18));

    let mut edit = item("SKF-6203", "SKF", "6203");
    edit.selling_price_mrp = Money::from_rupees(125);
    edit.quantity = None;
    let updated = db.items().update(created.id, &edit).await.unwrap();
    assert_eq!(updated.selling_price_mrp, Money::from_rupees(125));
    assert_eq!(updated.quantity, 20, "omitted quantity keeps stock");

    assert_eq!(db.items().list().await.unwrap().len(), 1);

    let deleted = db.items().delete(created.id).await.unwrap();
    assert_eq!(deleted.code, "SKF-6203");
    assert!(db.items().find_by_id(created.id).await.unwrap().is_none());

    let err = db.items().delete(created.id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_item_identity_is_case_insensitive() {
    let db = setup().await;
    db.items().create(&item("A1", "SKF", "6203")).await.unwrap();

    let err = db
        .items()
        .create(&item("A2", "  skf ", "6203"))
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Domain(CoreError::DuplicateItem { .. })));
    assert_eq!(db.items().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_item_duplicate_code() {
    let db = setup().await;
    db.items().create(&item("A1", "SKF", "6203")).await.unwrap();

    let err = db.items().create(&item("A1", "FAG", "6203")).await.unwrap_err();

    assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "code"));
}

#[tokio::test]
async fn test_item_rejects_negative_price() {
    let db = setup().await;
    let mut input = item("A1", "SKF", "6203");
    input.purchase_price = Money::from_rupees(-1);

    let err = db.items().create(&input).await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
}

#[tokio::test]
async fn test_adjust_quantity() {
    let db = setup().await;
    db.items().create(&item("A1", "SKF", "6203")).await.unwrap();

    let after = db.items().adjust_quantity("A1", 5, StockPolicy::Reject).await.unwrap();
    assert_eq!(after.quantity, 25);

    let after = db.items().adjust_quantity("A1", -25, StockPolicy::Reject).await.unwrap();
    assert_eq!(after.quantity, 0);

    let err = db
        .items()
        .adjust_quantity("A1", -1, StockPolicy::Reject)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { available: 0, requested: 1, .. })));

    let err = db
        .items()
        .adjust_quantity("MISSING", 1, StockPolicy::Reject)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::ItemNotFound(_))));
}

// =============================================================================
// GST invoices
// =============================================================================

fn invoice_request(lines: Vec<InvoiceLineRequest>) -> GstInvoiceRequest {
    GstInvoiceRequest {
        customer_details: CustomerDetails {
            name: "Sharma Motors".to_string(),
            address: "12 GT Road, Ludhiana".to_string(),
            gstin: Some("03ABCDE1234F1Z5".to_string()),
            phone: "9876543210".to_string(),
        },
        items: lines,
        payment_mode: "Cash".to_string(),
        purchase_mode: "Counter".to_string(),
    }
}

fn line(code: &str, quantity: i64) -> InvoiceLineRequest {
    InvoiceLineRequest {
        code: code.to_string(),
        quantity: Some(quantity),
        taxable_value: None,
    }
}

#[tokio::test]
async fn test_invoice_pricing_and_numbering() {
    let db = setup().await;
    db.items().create(&item("A1", "SKF", "6203")).await.unwrap();

    let date = day(2024, 3, 5);
    let first = db
        .invoices()
        .create_on(&invoice_request(vec![line("A1", 2)]), date)
        .await
        .unwrap();

    assert_eq!(first.invoice_number, "INV-05032024-01");
    assert_eq!(first.items.len(), 1);
    let l = &first.items[0];
    assert_eq!(l.description, "SKF | Ball Bearing | 6203");
    assert_eq!(l.rate, Money::from_rupees(100));
    assert_eq!(l.taxable_value, Money::from_rupees(200));
    assert_eq!(l.cgst, Money::from_rupees(18));
    assert_eq!(l.sgst, Money::from_rupees(18));
    assert_eq!(first.total_amount, Money::from_rupees(236));
    assert_eq!(first.total_tax, Money::from_rupees(36));

    let mut manual = line("A1", 1);
    manual.taxable_value = Some(Money::from_rupees(150));
    let second = db
        .invoices()
        .create_on(&invoice_request(vec![manual]), date)
        .await
        .unwrap();
    assert_eq!(second.invoice_number, "INV-05032024-02");
    assert_eq!(second.subtotal, Money::from_rupees(150));
    assert_eq!(second.total_amount, Money::from_rupees(177));

    let next_day = db
        .invoices()
        .create_on(&invoice_request(vec![line("A1", 1)]), day(2024, 3, 6))
        .await
        .unwrap();
    assert_eq!(next_day.invoice_number, "INV-06032024-01");

    // Stock is untouched by invoicing
    let stock = db.items().find_by_code("A1").await.unwrap().unwrap().quantity;
    assert_eq!(stock, 20);

    let fetched = db.invoices().get_by_id(first.id).await.unwrap().unwrap();
    assert_eq!(fetched, first);
}

#[tokio::test]
async fn test_invoice_unknown_product_stores_nothing() {
    let db = setup().await;
    db.items().create(&item("A1", "SKF", "6203")).await.unwrap();

    let err = db
        .invoices()
        .create(&invoice_request(vec![line("A1", 1), line("ZZ", 1)]))
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Domain(CoreError::ItemNotFound(ref c)) if c == "ZZ"));
    assert!(db.invoices().get_by_id(1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_product() {
    let db = setup().await;
    db.items().create(&item("A1", "SKF", "6203")).await.unwrap();

    let product = db.invoices().find_product("A1").await.unwrap().unwrap();
    assert_eq!(product.subcategory, "6203");
    assert_eq!(product.gst, Percentage::from_percent(18));
    assert!(db.invoices().find_product("nope").await.unwrap().is_none());
}

// =============================================================================
// Cash flow & P&L
// =============================================================================

fn flow(direction: FlowDirection, rupees: i64, date: NaiveDate) -> CashFlowInput {
    CashFlowInput {
        category: "Rent".to_string(),
        subcategory: direction,
        amount: Money::from_rupees(rupees),
        date: Some(date),
    }
}

#[tokio::test]
async fn test_cash_flow_filters() {
    let db = setup().await;
    let repo = db.cash_flow();
    repo.create(&flow(FlowDirection::InFlow, 100, day(2024, 5, 2))).await.unwrap();
    repo.create(&flow(FlowDirection::OutFlow, 40, day(2024, 5, 20))).await.unwrap();
    repo.create(&flow(FlowDirection::InFlow, 70, day(2023, 5, 9))).await.unwrap();
    repo.create(&flow(FlowDirection::InFlow, 10, day(2024, 6, 1))).await.unwrap();

    let all = repo.list(&CashFlowFilter::default()).await.unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].date, day(2024, 6, 1));

    let single = CashFlowFilter {
        filter_type: Some("single".into()),
        custom_date: Some(day(2024, 5, 2)),
        ..Default::default()
    };
    assert_eq!(repo.list(&single).await.unwrap().len(), 1);

    let range = CashFlowFilter {
        filter_type: Some("range".into()),
        start_date: Some(day(2024, 5, 1)),
        end_date: Some(day(2024, 5, 31)),
        ..Default::default()
    };
    assert_eq!(repo.list(&range).await.unwrap().len(), 2);

    let may = CashFlowFilter {
        filter_type: Some("month".into()),
        month: Some(5),
        ..Default::default()
    };
    assert_eq!(repo.list(&may).await.unwrap().len(), 3);

    let inflow_2024 = CashFlowFilter {
        filter_type: Some("year".into()),
        year: Some(2024),
        subcategory: Some(FlowDirection::InFlow),
        ..Default::default()
    };
    assert_eq!(repo.list(&inflow_2024).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_cash_flow_update_and_delete() {
    let db = setup().await;
    let repo = db.cash_flow();
    let entry = repo.create(&flow(FlowDirection::InFlow, 100, day(2024, 5, 2))).await.unwrap();

    let updated = repo
        .update(entry.id, &flow(FlowDirection::OutFlow, 55, day(2024, 5, 3)))
        .await
        .unwrap();
    assert_eq!(updated.subcategory, FlowDirection::OutFlow);
    assert_eq!(updated.amount, Money::from_rupees(55));

    repo.delete(entry.id).await.unwrap();
    assert!(repo.delete(entry.id).await.unwrap_err().is_not_found());
    assert!(repo.update(entry.id, &flow(FlowDirection::InFlow, 1, day(2024, 1, 1))).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_profit_loss_filters() {
    let db = setup().await;
    let repo = db.profit_loss();

    let entry = |month: &str, kind: PnlKind, rupees: i64| PnlInput {
        month: month.to_string(),
        category: "Sales".to_string(),
        kind,
        amount: Money::from_rupees(rupees),
    };
    repo.create(&entry("2024-03", PnlKind::Income, 5000)).await.unwrap();
    repo.create(&entry("2024-03", PnlKind::Expense, 1200)).await.unwrap();
    let april = repo.create(&entry("2024-04", PnlKind::Income, 800)).await.unwrap();

    let all = repo.list(&PnlFilter::default()).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].month, "2024-04");

    let march_income = PnlFilter {
        month: Some("2024-03".into()),
        kind: Some(PnlKind::Income),
    };
    let rows = repo.list(&march_income).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount, Money::from_rupees(5000));

    let err = repo.create(&entry("2024-13", PnlKind::Income, 1)).await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

    let updated = repo.update(april.id, &entry("2024-04", PnlKind::Expense, 900)).await.unwrap();
    assert_eq!(updated.kind, PnlKind::Expense);

    repo.delete(april.id).await.unwrap();
    assert!(repo.delete(april.id).await.unwrap_err().is_not_found());
}

// =============================================================================
// Cash-credit account
// =============================================================================

#[tokio::test]
async fn test_credit_summary_and_limit() {
    let db = setup().await;
    let repo = db.credit();

    assert_eq!(repo.account_limit().await.unwrap(), DEFAULT_ACCOUNT_LIMIT);

    let txn = |kind: TransactionKind, rupees: i64| CreditTransactionInput {
        date: Some(day(2024, 4, 1)),
        kind,
        description: Some("  monthly ".to_string()),
        amount: Money::from_rupees(rupees),
    };
    let first = repo.create_transaction(&txn(TransactionKind::Withdrawal, 300_000)).await.unwrap();
    assert_eq!(first.description.as_deref(), Some("monthly"));
    repo.create_transaction(&txn(TransactionKind::Deposit, 100_000)).await.unwrap();
    repo.create_transaction(&txn(TransactionKind::InterestBank, 5_000)).await.unwrap();
    repo.create_transaction(&txn(TransactionKind::InterestUs, 2_000)).await.unwrap();

    repo.set_account_limit(Money::from_rupees(500_000)).await.unwrap();
    assert_eq!(repo.account_limit().await.unwrap(), Money::from_rupees(500_000));

    let summary = repo.summary().await.unwrap();
    assert_eq!(summary.outstanding, Money::from_rupees(-203_000));
    assert_eq!(summary.pending_deposits, Money::from_rupees(200_000));
    assert_eq!(summary.pending_interest, Money::from_rupees(3_000));
    assert_eq!(summary.available, Money::from_rupees(297_000));
    assert_eq!(summary.account_limit, Money::from_rupees(500_000));

    assert_eq!(repo.list_transactions().await.unwrap().len(), 4);
    repo.delete_transaction(first.id).await.unwrap();
    assert!(repo.delete_transaction(first.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_interest_calculation_is_computed_server_side() {
    let db = setup().await;
    let repo = db.credit();

    let calc = repo
        .create_calculation(&InterestInput {
            date: Some(day(2024, 4, 30)),
            principal: Money::from_rupees(100_000),
            interest_rate: Percentage::from_percent(12),
            days: Some(30),
        })
        .await
        .unwrap();

    assert_eq!(calc.calculated_interest.paise(), 98_630);
    assert_eq!(repo.summary().await.unwrap().calculated_interest.paise(), 98_630);

    let err = repo
        .create_calculation(&InterestInput {
            date: None,
            principal: Money::from_rupees(1),
            interest_rate: Percentage::from_percent(12),
            days: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

    repo.delete_calculation(calc.id).await.unwrap();
    assert!(repo.list_calculations().await.unwrap().is_empty());
    assert!(repo.delete_calculation(calc.id).await.unwrap_err().is_not_found());
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_users() {
    let db = setup().await;
    let repo = db.users();

    let user = repo.create("asha", Some("asha@example.com"), "hash-1").await.unwrap();
    assert_eq!(user.username, "asha");

    let err = repo.create("asha", None, "hash-2").await.unwrap_err();
    assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "username"));

    let creds = repo.find_credentials("asha").await.unwrap().unwrap();
    assert_eq!(creds.password_hash, "hash-1");
    assert!(repo.find_credentials("nobody").await.unwrap().is_none());

    let renamed = repo.update(user.id, "asha.k", Some(""), None).await.unwrap();
    assert_eq!(renamed.username, "asha.k");
    assert_eq!(renamed.email, None);
    let creds = repo.find_credentials_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(creds.password_hash, "hash-1");

    repo.update(user.id, "asha.k", None, Some("hash-3")).await.unwrap();
    let creds = repo.find_credentials_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(creds.password_hash, "hash-3");
    assert_eq!(creds.into_user().id, user.id);

    assert!(repo.update(999, "ghost", None, None).await.unwrap_err().is_not_found());
    assert_eq!(repo.list().await.unwrap().len(), 1);
}

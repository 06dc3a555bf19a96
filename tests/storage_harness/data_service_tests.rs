//! Macro-generated contract suite for `DataService` implementations.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//!
//! data_service_tests!(
//!     InMemoryDataService::<Invoice>::new(),
//!     InMemoryDataService::<Lead>::new()
//! );
//! ```
//!
//! Both factories are re-evaluated for each test so every test starts on an
//! empty collection.

/// Generate the `DataService` conformance suite for one backend.
///
/// `$invoices` must evaluate to a `DataService<Invoice>` and `$leads` to a
/// `DataService<Lead>`.
#[macro_export]
macro_rules! data_service_tests {
    ($invoices:expr, $leads:expr) => {
        mod data_service_contract_tests {
            use super::*;
            use chrono::Utc;
            use crm::core::{DataService, Entity, Record, SearchQuery};
            use serde_json::json;
            use uuid::Uuid;

            fn query(raw: &str) -> SearchQuery {
                SearchQuery::parse(raw, chrono_tz::Asia::Kolkata).unwrap()
            }

            // ==================================================================
            // CRUD
            // ==================================================================

            #[tokio::test]
            async fn test_create_and_get_keeps_totals() {
                let service = $invoices;
                let invoice = sample_invoice("Acme Traders");
                let id = invoice.id();

                service.create(invoice).await.unwrap();
                let stored = service.get(&id).await.unwrap().expect("invoice stored");

                assert_eq!(stored.company_name, "Acme Traders");
                assert_eq!(stored.total_without_gst, 900.0);
                assert_eq!(stored.total_with_gst, 1062.0);
                assert_eq!(stored.remaining_amount, 562.0);
                assert!(stored.end_date.is_some());
            }

            #[tokio::test]
            async fn test_get_nonexistent() {
                let service = $invoices;
                assert!(service.get(&Uuid::new_v4()).await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_list_empty_then_newest_first() {
                let service = $leads;
                assert!(service.list().await.unwrap().is_empty());

                let times = creation_times(3);
                for (i, at) in times.iter().enumerate() {
                    service
                        .create(sample_lead(&format!("Lead{}", i), 100.0, *at))
                        .await
                        .unwrap();
                }

                let names: Vec<String> = service
                    .list()
                    .await
                    .unwrap()
                    .into_iter()
                    .map(|l| l.company_name)
                    .collect();
                assert_eq!(names, vec!["Lead2", "Lead1", "Lead0"]);
                assert_eq!(service.count().await.unwrap(), 3);
            }

            #[tokio::test]
            async fn test_update_existing() {
                let service = $invoices;
                let invoice = service.create(sample_invoice("Acme")).await.unwrap();

                let mut merged = invoice.merge(json!({"paidAmount": 1062})).unwrap();
                merged.touch();
                service.update(&invoice.id, merged).await.unwrap();

                let stored = service.get(&invoice.id).await.unwrap().unwrap();
                assert_eq!(stored.paid_amount, 1062.0);
                assert_eq!(stored.remaining_amount, 0.0);
                assert_eq!(stored.company_name, "Acme");
            }

            #[tokio::test]
            async fn test_update_nonexistent() {
                let service = $invoices;
                let invoice = sample_invoice("Ghost");
                assert!(service.update(&Uuid::new_v4(), invoice).await.is_err());
            }

            #[tokio::test]
            async fn test_delete_reports_presence() {
                let service = $invoices;
                let invoice = service.create(sample_invoice("Acme")).await.unwrap();

                assert!(service.delete(&invoice.id).await.unwrap());
                assert!(!service.delete(&invoice.id).await.unwrap());
                assert!(service.get(&invoice.id).await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_create_duplicate_id_fails() {
                let service = $invoices;
                let invoice = sample_invoice("Acme");
                service.create(invoice.clone()).await.unwrap();
                assert!(service.create(invoice).await.is_err());
            }

            // ==================================================================
            // Search
            // ==================================================================

            #[tokio::test]
            async fn test_search_text_case_insensitive() {
                let service = $leads;
                for (i, at) in creation_times(2).into_iter().enumerate() {
                    let name = if i == 0 { "Zenith Foods" } else { "Orbit Labs" };
                    service.create(sample_lead(name, 100.0, at)).await.unwrap();
                }

                let hits = service.search(&query("zenith"), 5).await.unwrap();
                assert_eq!(hits.len(), 1);
                assert_eq!(hits[0].company_name, "Zenith Foods");
            }

            #[tokio::test]
            async fn test_search_numeric_equality() {
                let service = $invoices;
                service.create(sample_invoice("Acme")).await.unwrap();

                let hits = service.search(&query("900"), 5).await.unwrap();
                assert_eq!(hits.len(), 1);
                assert!(service.search(&query("901"), 5).await.unwrap().is_empty());
            }

            #[tokio::test]
            async fn test_search_regex_characters_are_literal() {
                let service = $leads;
                service
                    .create(sample_lead("A+B (Pvt)", 10.0, Utc::now()))
                    .await
                    .unwrap();
                service
                    .create(sample_lead("AAB Pvt", 10.0, Utc::now()))
                    .await
                    .unwrap();

                let hits = service.search(&query("A+B (Pvt)"), 5).await.unwrap();
                assert_eq!(hits.len(), 1);
                assert_eq!(hits[0].company_name, "A+B (Pvt)");
            }

            #[tokio::test]
            async fn test_search_date_same_day() {
                let service = $invoices;
                for (company, end_date) in [
                    ("Bare Day", "2025-05-04"),
                    // 00:00:00.5 on 4 May in Kolkata
                    ("Just After Midnight", "2025-05-03T18:30:00.500Z"),
                    ("Last Second", "2025-05-04T18:29:59Z"),
                    // 01:30 on 5 May in Kolkata
                    ("Next Day", "2025-05-04T20:00:00Z"),
                    ("Day Before", "2025-05-03"),
                ] {
                    let invoice = sample_invoice(company)
                        .merge(json!({"endDate": end_date}))
                        .unwrap();
                    service.create(invoice).await.unwrap();
                }

                let mut hits: Vec<String> = service
                    .search(&query("2025-05-04"), 5)
                    .await
                    .unwrap()
                    .into_iter()
                    .map(|invoice| invoice.company_name)
                    .collect();
                hits.sort();
                assert_eq!(hits, vec!["Bare Day", "Just After Midnight", "Last Second"]);

                let next: Vec<String> = service
                    .search(&query("05/05/2025"), 5)
                    .await
                    .unwrap()
                    .into_iter()
                    .map(|invoice| invoice.company_name)
                    .collect();
                assert_eq!(next, vec!["Next Day"]);
            }

            #[tokio::test]
            async fn test_search_respects_limit() {
                let service = $leads;
                for (i, at) in creation_times(7).into_iter().enumerate() {
                    service
                        .create(sample_lead(&format!("Match{}", i), 10.0, at))
                        .await
                        .unwrap();
                }
                let hits = service.search(&query("match"), 5).await.unwrap();
                assert_eq!(hits.len(), 5);
            }

            #[tokio::test]
            async fn test_search_no_results() {
                let service = $leads;
                service
                    .create(sample_lead("Acme", 10.0, Utc::now()))
                    .await
                    .unwrap();
                assert!(service.search(&query("nothing-like-this"), 5).await.unwrap().is_empty());
            }
        }
    };
}

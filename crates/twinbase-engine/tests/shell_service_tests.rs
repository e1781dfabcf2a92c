#![allow(clippy::unwrap_used, clippy::expect_used)]

use twinbase_core::model::{AssetAdministrationShell, Submodel};
use twinbase_core::TwinError;
use twinbase_engine::ShellService;

fn pump() -> ShellService {
    ShellService::new(AssetAdministrationShell::new("Pump", "urn:aas:pump"))
}

#[test]
fn test_attach_records_reference_once() {
    // GIVEN a shell and two submodels
    let service = pump();
    let nameplate = Submodel::new("Nameplate", "urn:sm:nameplate");
    let telemetry = Submodel::new("Telemetry", "urn:sm:telemetry");

    // WHEN both are attached and one is attached again
    service.attach_submodel(&nameplate).unwrap();
    service.attach_submodel(&telemetry).unwrap();
    let again = service.attach_submodel(&nameplate);

    // THEN the duplicate is rejected and each reference appears once
    assert!(matches!(again, Err(TwinError::DuplicateIdShort { .. })));
    assert_eq!(
        service.submodel_references(),
        vec![nameplate.reference(), telemetry.reference()]
    );
}

#[test]
fn test_delete_submodel_drops_reference() {
    let service = pump();
    let nameplate = Submodel::new("Nameplate", "urn:sm:nameplate");
    let telemetry = Submodel::new("Telemetry", "urn:sm:telemetry");
    service.attach_submodel(&nameplate).unwrap();
    service.attach_submodel(&telemetry).unwrap();

    service.delete_submodel("urn:sm:nameplate").unwrap();

    assert_eq!(service.submodel_references(), vec![telemetry.reference()]);
    let remaining = service.retrieve_submodels(None, None).unwrap();
    assert_eq!(remaining.items.len(), 1);
    assert_eq!(remaining.items[0].id_short.as_deref(), Some("Telemetry"));
}

#[test]
fn test_reference_pages_cover_every_submodel() {
    let service = pump();
    for i in 0..5 {
        service
            .attach_submodel(&Submodel::new(format!("Sm{}", i), format!("urn:sm:{}", i)))
            .unwrap();
    }

    let mut seen = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = service
            .retrieve_submodel_references(Some(2), cursor.as_deref())
            .unwrap();
        seen.extend(page.items.iter().map(|r| r.first_value().unwrap().to_string()));
        if !page.has_more {
            break;
        }
        cursor = page.cursor;
    }

    assert_eq!(
        seen,
        (0..5).map(|i| format!("urn:sm:{}", i)).collect::<Vec<_>>()
    );
}

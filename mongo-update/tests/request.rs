use mongo_update::bson::{doc, Bson, Document};
use mongo_update::ext::bson::Ser;
use mongo_update::{
    Comparator, Error, ErrorKind, KeyedPredicate, Number, Predicate, Update, UpdateRequest,
};
use serde::Serialize;

#[derive(Default)]
struct ItemUpdate {
    qty: Option<i64>,
    note: Option<String>,
}

impl Update for ItemUpdate {
    fn into_document(self) -> Result<Document, Error> {
        let mut doc = Document::new();
        if let Some(value) = self.qty {
            doc.insert("qty", value);
        }
        if let Some(value) = self.note {
            doc.insert("note", value);
        }
        Ok(doc)
    }
}

#[derive(Serialize)]
struct Size {
    h: f64,
    w: f64,
    uom: &'static str,
}

#[test]
fn inventory_update() {
    let predicate = Predicate::new()
        .key_path("item", "paper")
        .unwrap()
        .compare("qty", Comparator::Lt(50))
        .unwrap();
    let mut request = UpdateRequest::with_predicate(predicate, true).unwrap();
    request
        .set(
            "size",
            Ser(Size {
                h: 8.5,
                w: 11.0,
                uom: "in",
            }),
        )
        .unwrap()
        .set("status", "P")
        .unwrap()
        .increment_by("restocks", Number::Int64(1))
        .unwrap()
        .set("status", "A")
        .unwrap();

    assert_eq!(
        request.condition_document(),
        doc! { "item": "paper", "qty": { "$lt": 50 } }
    );
    assert_eq!(
        request.operation_document(),
        doc! {
            "$set": {
                "size": { "h": 8.5, "w": 11.0, "uom": "in" },
                "status": "A",
            },
            "$inc": { "restocks": 1i64 },
        }
    );
    assert_eq!(request.flags().bits(), 0b00);
}

#[test]
fn every_operator() {
    let mut request = UpdateRequest::new(false);
    request
        .set("a", 1)
        .unwrap()
        .unset("b")
        .increment("c")
        .bitwise_or("d", 4)
        .add_to_set("e", "x")
        .unwrap()
        .remove_matching_from_array("f", 0)
        .unwrap()
        .remove_all_matching_from_array("g", vec![1, 2])
        .unwrap()
        .append_to_array("h", true)
        .unwrap()
        .append_all_to_array("i", vec!["y", "z"])
        .unwrap()
        .remove_first_from_array("j")
        .rename_key("k", "l");

    let rendered = request.operation_document();
    let operators: Vec<&String> = rendered.keys().collect();
    assert_eq!(
        operators,
        vec![
            "$set",
            "$unset",
            "$inc",
            "$bit",
            "$addToSet",
            "$pull",
            "$pullAll",
            "$push",
            "$pushAll",
            "$pop",
            "$rename",
        ]
    );
}

#[test]
fn typed_update_merges_into_set() {
    let mut request = UpdateRequest::new(true);
    request.set("qty", 1).unwrap();
    request
        .set_fields(ItemUpdate {
            qty: Some(10),
            note: Some("restocked".to_owned()),
        })
        .unwrap();
    assert_eq!(
        request.operation_document(),
        doc! { "$set": { "qty": 10i64, "note": "restocked" } }
    );
}

#[test]
fn typed_update_unsets_present_fields() {
    let mut request = UpdateRequest::new(true);
    request
        .unset_fields(ItemUpdate {
            note: Some(String::new()),
            ..ItemUpdate::default()
        })
        .unwrap();
    assert_eq!(request.operation_document(), doc! { "$unset": { "note": 1 } });
}

#[test]
fn mode_switches() {
    let mut request = UpdateRequest::new(true);
    request.set("a", 1).unwrap();
    request.replace_document_with(doc! { "b": 2 });
    assert_eq!(request.operation_document(), doc! { "b": 2 });
    request.rename_key("b", "c");
    assert_eq!(request.operation_document(), doc! { "$rename": { "b": "c" } });

    let e = request
        .try_replace_document_with(doc! { "d": 3 })
        .unwrap_err();
    assert_eq!(*e.kind(), ErrorKind::ModeConflict);
}

#[test]
fn failed_operand_keeps_request() {
    let mut request = UpdateRequest::new(false);
    request.set("a", 1).unwrap();
    let before = request.clone();

    let e = request
        .increment_by("b", Bson::Boolean(true))
        .unwrap_err();
    assert_eq!(*e.kind(), ErrorKind::InvalidOperand);
    let e = request.set("c", u64::MAX).unwrap_err();
    assert_eq!(*e.kind(), ErrorKind::InvalidOperand);
    assert!(request
        .append_all_to_array("d", vec![Some(1u64), Some(u64::MAX)])
        .is_err());

    assert_eq!(request, before);
}

#[test]
fn pull_embedded_documents() {
    let mut request = UpdateRequest::with_predicate(doc! { "_id": 1 }, true).unwrap();
    request
        .remove_matching_from_array_using_predicate(
            KeyedPredicate::new("results")
                .key_path("item", "B")
                .unwrap()
                .compare("score", Comparator::Gte(8))
                .unwrap(),
        )
        .unwrap();
    assert_eq!(
        request.operation_document(),
        doc! { "$pull": { "results": { "item": "B", "score": { "$gte": 8 } } } }
    );
}

#[test]
fn isolated_multi_update() {
    let mut request = UpdateRequest::with_predicate(doc! { "status": "A" }, false).unwrap();
    request.set_blocks_during_multi_updates(true).unset("lock");
    assert_eq!(
        request.condition_document(),
        doc! { "status": "A", "$isolated": 1 }
    );
    assert!(request.flags().multi_update());
    assert!(!request.flags().upsert());
}

#[test]
fn description() {
    let mut request = UpdateRequest::new(false);
    request.unset("a");
    let description = request.description();
    assert!(description.starts_with("update (0b10) condition: {}"));
    assert!(description.contains("\"$unset\""));
}

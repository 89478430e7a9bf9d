use mongo_update::bson::{doc, Document};

pub const COLLECTION: &str = "items";

#[allow(dead_code)]
pub fn setup() {
    // NOTE: The blocking client only sends updates, so seed the collection from a runtime...
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async_setup());
}

pub async fn async_setup() {
    let client = mongo_update::Client::new();
    client.database().drop(None).await.unwrap();
    client
        .collection(COLLECTION)
        .insert_many(items(), None)
        .await
        .unwrap();
}

#[allow(dead_code)]
pub async fn find(filter: Document) -> Vec<Document> {
    use futures::stream::StreamExt;

    let client = mongo_update::Client::new();
    let mut cursor = client.collection(COLLECTION).find(filter, None).await.unwrap();
    let mut documents = vec![];
    while let Some(res) = cursor.next().await {
        documents.push(res.unwrap());
    }
    documents
}

fn items() -> Vec<Document> {
    vec![
        doc! { "sku": "abc", "qty": 5, "tags": ["red", "blank"], "flags": 0b0110 },
        doc! { "sku": "def", "qty": 0, "tags": ["blue"], "flags": 0 },
    ]
}

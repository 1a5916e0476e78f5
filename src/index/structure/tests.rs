use super::*;

fn ids(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn keyword_add_is_set_semantics() {
    let mut table = KeywordTable::default();

    assert!(table.add("foo", "chunk-1"));
    assert!(!table.add("foo", "chunk-1"));
    assert!(table.add("foo", "chunk-2"));

    assert_eq!(table.get("foo"), Some(&ids(&["chunk-1", "chunk-2"])));
    assert_eq!(table.len(), 1);
}

#[test]
fn ensure_keyword_keeps_existing_ids() {
    let mut table = KeywordTable::default();
    table.add("foo", "chunk-1");

    table.ensure_keyword("foo");
    table.ensure_keyword("bar");

    assert_eq!(table.get("foo"), Some(&ids(&["chunk-1"])));
    assert_eq!(table.get("bar"), Some(&BTreeSet::new()));
    assert!(table.contains_keyword("bar"));
}

#[test]
fn removing_chunks_drops_emptied_keywords_only() {
    let mut table = KeywordTable::default();
    table.add("foo", "chunk-1");
    table.add("bar", "chunk-1");
    table.add("bar", "chunk-2");
    table.ensure_keyword("standalone");

    let emptied = table.remove_chunks(&ids(&["chunk-1"]));

    assert_eq!(emptied, vec!["foo".to_string()]);
    assert_eq!(
        table.keywords().collect::<Vec<_>>(),
        vec!["bar", "standalone"]
    );
    assert_eq!(table.referenced_chunks(), ids(&["chunk-2"]));
}

#[test]
fn triplet_table_deduplicates_edges() {
    let mut table = TripletTable::default();
    let triplet = Triplet::new("Jane", "is mother of", "Bob");

    assert!(table.insert(&triplet));
    assert!(!table.insert(&triplet));
    assert!(table.insert(&Triplet::new("Jane", "lives in", "Paris")));

    assert!(table.contains(&triplet));
    assert_eq!(table.subject_count(), 1);
    assert_eq!(table.edge_count(), 2);
    assert_eq!(
        table.triplets().collect::<Vec<_>>(),
        vec![
            Triplet::new("Jane", "is mother of", "Bob"),
            Triplet::new("Jane", "lives in", "Paris"),
        ]
    );
}

#[test]
fn rel_map_follows_edges_up_to_depth() {
    let mut table = TripletTable::default();
    table.insert(&Triplet::new("Alice", "knows", "Bob"));
    table.insert(&Triplet::new("Bob", "works at", "Acme"));
    table.insert(&Triplet::new("Acme", "located in", "Berlin"));

    let subjects = vec!["Alice".to_string()];

    let shallow = table.rel_map(&subjects, 1, 30);
    assert_eq!(
        shallow.get("Alice"),
        Some(&vec![vec![
            "Alice".to_string(),
            "knows".to_string(),
            "Bob".to_string()
        ]])
    );

    let deep = table.rel_map(&subjects, 2, 30);
    assert_eq!(
        deep.get("Alice"),
        Some(&vec![
            vec!["Alice".to_string(), "knows".to_string(), "Bob".to_string()],
            vec![
                "Alice".to_string(),
                "knows".to_string(),
                "Bob".to_string(),
                "works at".to_string(),
                "Acme".to_string()
            ],
        ])
    );
}

#[test]
fn rel_map_skips_cycles_and_respects_limit() {
    let mut table = TripletTable::default();
    table.insert(&Triplet::new("A", "to", "B"));
    table.insert(&Triplet::new("B", "to", "A"));
    table.insert(&Triplet::new("A", "also", "C"));

    let subjects = vec!["A".to_string(), "missing".to_string()];
    let rel_map = table.rel_map(&subjects, 5, 30);

    let paths = rel_map.get("A").expect("A has edges");
    assert_eq!(paths.len(), 2);
    assert!(
        paths
            .iter()
            .all(|path| path.iter().filter(|node| *node == "A").count() == 1)
    );
    assert!(!rel_map.contains_key("missing"));

    let limited = table.rel_map(&subjects[..1], 5, 1);
    assert_eq!(limited.get("A").map(Vec::len), Some(1));

    assert!(table.rel_map(&subjects, 5, 0).is_empty());
}

#[test]
fn embedding_table_keeps_first_value_and_order() {
    let mut table = EmbeddingTable::default();

    assert!(table.insert("(b, is, c)".to_string(), vec![1.0]));
    assert!(table.insert("(a, is, c)".to_string(), vec![2.0]));
    assert!(!table.insert("(b, is, c)".to_string(), vec![9.0]));

    assert_eq!(table.len(), 2);
    assert_eq!(table.get("(b, is, c)"), Some([1.0_f32].as_slice()));
    assert_eq!(
        table.iter().map(|(key, _)| key).collect::<Vec<_>>(),
        vec!["(b, is, c)", "(a, is, c)"]
    );
}

#[test]
fn embedding_table_serializes_as_ordered_entries() {
    let mut table = EmbeddingTable::default();
    table.insert("(z, is, y)".to_string(), vec![0.5, 0.25]);
    table.insert("(a, is, b)".to_string(), vec![1.0, 0.0]);

    let json = serde_json::to_string(&table).expect("serializes");
    assert!(json.starts_with("[{\"key\":\"(z, is, y)\""));

    let restored: EmbeddingTable = serde_json::from_str(&json).expect("deserializes");
    assert_eq!(restored, table);
    assert!(restored.contains("(a, is, b)"));
}

#[test]
fn index_struct_add_node_and_upsert() {
    let mut index_struct = KgIndexStruct::new(false);
    let triplet = Triplet::new("foo", "is", "bar");

    index_struct.add_node(&["foo", "bar"], "chunk-1");
    assert!(index_struct.upsert_triplet(&triplet, &["foo", "bar"]));
    assert!(!index_struct.upsert_triplet(&triplet, &["foo", "bar"]));

    assert_eq!(index_struct.node_ids, ids(&["chunk-1"]));
    assert_eq!(index_struct.table.get("bar"), Some(&ids(&["chunk-1"])));
    assert!(index_struct.embeddings.is_none());
    assert!(KgIndexStruct::new(true).embeddings.is_some());
}

#[test]
fn remove_nodes_keeps_edges() {
    let mut index_struct = KgIndexStruct::new(false);
    let triplet = Triplet::new("foo", "is", "bar");
    index_struct.add_node(&["foo", "bar"], "chunk-1");
    index_struct.upsert_triplet(&triplet, &["foo", "bar"]);

    let emptied = index_struct.remove_nodes(&ids(&["chunk-1"]));

    assert_eq!(emptied, vec!["bar".to_string(), "foo".to_string()]);
    assert!(index_struct.node_ids.is_empty());
    assert!(index_struct.table.is_empty());
    assert!(index_struct.triplets.contains(&triplet));
}

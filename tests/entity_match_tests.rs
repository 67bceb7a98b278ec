use almond::entity::{edit_distance, get_best_entity_match, EntityRecord};

fn record(entity_type: &str, value: &str, name: &str) -> EntityRecord {
    EntityRecord::new(entity_type, value, name)
}

#[test]
fn test_edit_distance() {
    assert_eq!(edit_distance("kitten", "sitting"), 3);
    assert_eq!(edit_distance("abc", "abc"), 0);
    assert_eq!(edit_distance("abc", "abcdef"), 3);
    assert_eq!(edit_distance("abcdef", "abc"), 3);
    assert_eq!(edit_distance("drake", "nick"), 4);
}

#[test]
fn test_exact_canonical_short_circuits() {
    let candidates = vec![
        EntityRecord {
            entity_type: "com.example:thing".into(),
            value: "a".into(),
            canonical: "Foo Bar Baz Bat".into(),
            name: "Foo Bar Baz Bat".into(),
        },
        EntityRecord {
            entity_type: "com.example:thing".into(),
            value: "b".into(),
            canonical: "Foo Bar".into(),
            name: "Foo Bar".into(),
        },
    ];
    // the first candidate scores higher on tokens alone
    let best = get_best_entity_match("Foo Bar", "com.example:thing", &candidates).unwrap();
    assert_eq!(best.value, "b");
}

#[test]
fn test_token_scoring_prefers_whole_token_match() {
    let candidates = vec![
        record("com.spotify:artist", "drakeo", "Drakeo the Ruler"),
        record("com.spotify:artist", "nick", "Nick Drake"),
    ];
    // 9.5 for "nick drake" against 9.2 for "drakeo the ruler"
    let best = get_best_entity_match("drake", "com.spotify:artist", &candidates).unwrap();
    assert_eq!(best.value, "nick");
}

#[test]
fn test_parenthetical_suffix_is_ignored() {
    let candidates = vec![
        record("com.spotify:album", "deluxe", "Night Visions (Deluxe)"),
        record("com.spotify:album", "plain", "Night Visions"),
    ];
    let best = get_best_entity_match("night visions (live)", "com.spotify:album", &candidates).unwrap();
    assert_eq!(best.value, "plain");
}

#[test]
fn test_ties_keep_first_candidate() {
    let candidates = vec![
        record("com.example:thing", "first", "Blue Note"),
        record("com.example:thing", "second", "Blue Note"),
    ];
    let best = get_best_entity_match("blue notes", "com.example:thing", &candidates).unwrap();
    assert_eq!(best.value, "first");
}

#[test]
fn test_no_candidates_is_no_match() {
    assert!(get_best_entity_match("anything", "com.example:thing", &[]).is_none());
}

#[test]
fn test_music_catalog_cases() {
    let cases: Vec<(&str, &str, &str, Vec<EntityRecord>)> = vec![
        (
            "bohemian rhapsody",
            "spotify:track:6l8GvAyoUZwWDgF1e4822w",
            "com.spotify:song",
            vec![
                record("com.spotify:song", "spotify:track:7tFiyTwD0nx5a1eklYtX2J", "Bohemian Rhapsody - 2011 Mix"),
                record("com.spotify:song", "spotify:track:6l8GvAyoUZwWDgF1e4822w", "Bohemian Rhapsody"),
                record("com.spotify:song", "spotify:track:3Rvjhi2fdHU7qLIv4a4MCy", "Bohemian Rhapsody - Live Aid"),
            ],
        ),
        (
            "hotel california",
            "spotify:track:2ilnn2pGrYpFPc1H4qhp7t",
            "com.spotify:song",
            vec![
                record("com.spotify:song", "spotify:track:40riOy7x9W7GXjyGp4pjAv", "Hotel California - 2013 Remaster"),
                record("com.spotify:song", "spotify:track:2ilnn2pGrYpFPc1H4qhp7t", "Hotel California"),
                record("com.spotify:song", "spotify:track:5nS9WEWYnbQDBAe81SHhDP", "Hotel California (Cover)"),
            ],
        ),
        (
            "taylor swift",
            "spotify:artist:06HL4z0CvFAxyc27GXpf02",
            "com.spotify:artist",
            vec![
                record("com.spotify:artist", "spotify:artist:06HL4z0CvFAxyc27GXpf02", "Taylor Swift"),
                record("com.spotify:artist", "spotify:artist:5WiLThuSBwqF7SMRrzQbG6", "Taylor Swiftman"),
            ],
        ),
        (
            "physical graffiti",
            "spotify:album:0JpERbnfgcW2UYkdgmhlkR",
            "com.spotify:album",
            vec![
                record("com.spotify:album", "spotify:album:1lZahjeu4AhPkg9JARZr5F", "Physical Graffiti (1994 Remaster)"),
                record("com.spotify:album", "spotify:album:5eJll4BBJx3Q1Dx2up8pvL", "Physical Graffiti - EP"),
                record("com.spotify:album", "spotify:album:0JpERbnfgcW2UYkdgmhlkR", "Physical Graffiti"),
            ],
        ),
        (
            "beatles",
            "spotify:artist:3YojAkU7hiAalEunJy55JW",
            "com.spotify:artist",
            vec![
                record("com.spotify:artist", "spotify:artist:3WrFJ7ztbogyGnTHbHJFl2", "The Beatles"),
                record("com.spotify:artist", "spotify:artist:5o723EMxNulM5ydXRh7Qkk", "The Beatles Complete On Ukulele"),
                record("com.spotify:artist", "spotify:artist:2FzAxY7Uqnr32pF7L0nK3c", "Beatless"),
                record("com.spotify:artist", "spotify:artist:3YojAkU7hiAalEunJy55JW", "beatles"),
            ],
        ),
    ];

    for (search, expected, entity_type, candidates) in cases {
        let best = get_best_entity_match(search, entity_type, &candidates).unwrap();
        assert_eq!(best.value, expected, "search term {:?}", search);
    }
}

#[test]
fn test_ignorable_words_soften_penalty() {
    // same length, so only the ignorable "house" separates them
    let candidates = vec![
        record("com.yelp:restaurant", "bisto", "Zola Bisto"),
        record("com.yelp:restaurant", "house", "Zola House"),
    ];
    let best = get_best_entity_match("zola", "com.yelp:restaurant", &candidates).unwrap();
    assert_eq!(best.value, "house");
}

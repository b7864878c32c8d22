use super::*;

fn test_client(base_url: &str) -> TweetClient {
    TweetClient::with_base_url("test-token", base_url).expect("client construction should not fail")
}

fn batch(ids: &[&str]) -> Batch {
    Batch::new(ids.iter().map(|s| (*s).to_string()).collect()).unwrap()
}

#[test]
fn lookup_url_constructs_ids_and_fields() {
    let client = test_client("https://api.twitter.com");
    let url = client.lookup_url(&batch(&["1", "2", "3"]));
    assert_eq!(url.path(), "/2/tweets");

    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert_eq!(
        pairs,
        vec![
            ("ids".to_string(), "1,2,3".to_string()),
            ("tweet.fields".to_string(), TWEET_FIELDS.to_string()),
        ]
    );
}

#[test]
fn lookup_url_strips_trailing_slash() {
    let client = test_client("https://api.twitter.com///");
    let url = client.lookup_url(&batch(&["9"]));
    assert!(
        url.as_str().starts_with("https://api.twitter.com/2/tweets?ids=9&"),
        "unexpected url: {url}"
    );
}

#[test]
fn lookup_url_keeps_base_path_prefix() {
    let client = test_client("http://localhost:8080/proxy");
    let url = client.lookup_url(&batch(&["9"]));
    assert_eq!(url.path(), "/proxy/2/tweets");
}

#[test]
fn invalid_base_url_is_rejected() {
    let result = TweetClient::with_base_url("t", "not a url");
    assert!(matches!(result, Err(FetchError::InvalidBaseUrl { .. })));
}

#[test]
fn requested_fields_cover_lookup_contract() {
    for field in [
        "lang",
        "author_id",
        "created_at",
        "conversation_id",
        "referenced_tweets",
        "context_annotations",
        "entities",
        "in_reply_to_user_id",
    ] {
        assert!(TWEET_FIELDS.split(',').any(|f| f == field), "{field}");
    }
}

//! Parsing of YouTube's internal live chat JSON.
//!
//! Everything here is pure so it can be exercised against captured payloads.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::{Author, ChatEvent, EventKind};

/// What the watch page gives us to start polling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialData {
    pub continuation: String,
    pub api_key: String,
    pub client_version: String,
}

/// Extract the first continuation token and innertube settings from a watch page.
pub fn parse_watch_page(html: &str) -> Result<InitialData> {
    let re = Regex::new(r"(?s)var ytInitialData = (\{.*?\});</script>")?;
    let caps = re
        .captures(html)
        .ok_or_else(|| anyhow!("Failed to extract ytInitialData"))?;
    let initial: Value =
        serde_json::from_str(&caps[1]).context("Failed to parse ytInitialData")?;

    let continuation = initial["contents"]["twoColumnWatchNextResults"]["conversationBar"]
        ["liveChatRenderer"]["continuations"][0]["reloadContinuationData"]["continuation"]
        .as_str()
        .ok_or_else(|| anyhow!("No live chat on this video (continuation token missing)"))?
        .to_string();

    Ok(InitialData {
        continuation,
        api_key: innertube_setting(html, "INNERTUBE_API_KEY")?,
        client_version: innertube_setting(html, "INNERTUBE_CONTEXT_CLIENT_VERSION")?,
    })
}

fn innertube_setting(html: &str, key: &str) -> Result<String> {
    let re = Regex::new(&format!(r#"["']{}["']\s*:\s*["']([^"']+)["']"#, key))?;
    re.captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| anyhow!("Failed to extract {}", key))
}

/// Next continuation token and the delay the server asks for, in milliseconds.
pub fn next_continuation(resp: &Value) -> Option<(String, u64)> {
    let continuations = resp["continuationContents"]["liveChatContinuation"]["continuations"]
        .as_array()?;
    continuations.iter().find_map(|c| {
        let data = c
            .get("timedContinuationData")
            .or_else(|| c.get("invalidationContinuationData"))
            .or_else(|| c.get("reloadContinuationData"))?;
        let token = data["continuation"].as_str().filter(|t| !t.is_empty())?;
        let timeout = data["timeoutMs"].as_u64().unwrap_or(0);
        Some((token.to_string(), timeout))
    })
}

/// All chat events contained in one `get_live_chat` response, in order.
pub fn parse_actions(resp: &Value) -> Vec<ChatEvent> {
    let Some(actions) = resp["continuationContents"]["liveChatContinuation"]["actions"].as_array()
    else {
        return Vec::new();
    };

    actions
        .iter()
        .filter_map(|action| action.get("addChatItemAction"))
        .filter_map(|add| parse_item(&add["item"]))
        .collect()
}

fn parse_item(item: &Value) -> Option<ChatEvent> {
    if let Some(renderer) = item.get("liveChatTextMessageRenderer") {
        parse_message(renderer, EventKind::TextMessage, "message")
    } else if let Some(renderer) = item.get("liveChatPaidMessageRenderer") {
        parse_message(renderer, EventKind::SuperChat, "message")
    } else if let Some(renderer) = item.get("liveChatPaidStickerRenderer") {
        parse_message(renderer, EventKind::SuperSticker, "message")
    } else if let Some(renderer) = item.get("liveChatMembershipItemRenderer") {
        parse_message(renderer, EventKind::NewSponsor, "headerSubtext")
    } else if let Some(renderer) = item.get("liveChatViewerEngagementMessageRenderer") {
        Some(ChatEvent {
            kind: EventKind::ViewerEngagementMessage,
            id: renderer["id"].as_str()?.to_string(),
            author: Author::default(),
            text: runs_text(&renderer["message"]),
            amount: None,
            amount_value: None,
            currency: None,
            bg_color: None,
            timestamp: parse_timestamp(&renderer["timestampUsec"])?,
        })
    } else if item.get("liveChatPlaceholderItemRenderer").is_some() {
        None
    } else {
        debug!("Unsupported live chat item: {}", item);
        None
    }
}

fn parse_message(renderer: &Value, kind: EventKind, text_field: &str) -> Option<ChatEvent> {
    let amount = renderer["purchaseAmountText"]["simpleText"]
        .as_str()
        .map(str::to_string);
    Some(ChatEvent {
        kind,
        id: renderer["id"].as_str()?.to_string(),
        author: parse_author(renderer)?,
        text: runs_text(&renderer[text_field]),
        amount_value: amount.as_deref().and_then(parse_amount_value),
        amount,
        currency: renderer["currency"].as_str().map(str::to_string),
        bg_color: renderer["headerBackgroundColor"]
            .as_u64()
            .and_then(|v| u32::try_from(v).ok()),
        timestamp: parse_timestamp(&renderer["timestampUsec"])?,
    })
}

/// `"¥1,000"` → `1000.0`, `"$2.00"` → `2.0`. Symbols and grouping commas are dropped.
fn parse_amount_value(display: &str) -> Option<f64> {
    let digits: String = display
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse().ok()
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let usec = value.as_str()?.parse::<i64>().ok()?;
    DateTime::from_timestamp_micros(usec)
}

fn parse_author(renderer: &Value) -> Option<Author> {
    let mut author = Author {
        name: renderer["authorName"]["simpleText"].as_str()?.to_string(),
        channel_id: renderer["authorExternalChannelId"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        ..Default::default()
    };

    let badges = renderer["authorBadges"].as_array().into_iter().flatten();
    for badge in badges {
        let label = badge["liveChatAuthorBadgeRenderer"]["accessibility"]["accessibilityData"]
            ["label"]
            .as_str()
            .unwrap_or_default()
            .to_lowercase();
        if label.contains("verified") || label.contains("認証済み") {
            author.is_verified = true;
        } else if label.contains("moderator") || label.contains("モデレーター") {
            author.is_chat_moderator = true;
        } else if label.contains("owner") || label.contains("所有者") {
            author.is_chat_owner = true;
        } else if label.contains("member") || label.contains("メンバー") {
            author.is_chat_sponsor = true;
        }
    }

    Some(author)
}

/// Flatten a `{runs: [...]}` or `{simpleText: ...}` node into plain text.
///
/// Emoji runs become their first shortcut (`:pig:`) so the alias table can
/// resolve them, falling back to the emoji id (the character itself for
/// standard emoji).
fn runs_text(node: &Value) -> String {
    if let Some(text) = node["simpleText"].as_str() {
        return text.to_string();
    }

    let mut text = String::new();
    for run in node["runs"].as_array().into_iter().flatten() {
        if let Some(t) = run["text"].as_str() {
            text.push_str(t);
        } else if let Some(emoji) = run.get("emoji") {
            let shortcut = emoji["shortcuts"][0]
                .as_str()
                .or_else(|| emoji["emojiId"].as_str())
                .unwrap_or_default();
            text.push_str(shortcut);
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(items: Vec<Value>) -> Value {
        let actions: Vec<Value> = items
            .into_iter()
            .map(|item| json!({ "addChatItemAction": { "item": item } }))
            .collect();
        json!({
            "continuationContents": {
                "liveChatContinuation": {
                    "actions": actions,
                    "continuations": [
                        { "timedContinuationData": { "continuation": "next-token", "timeoutMs": 5000 } }
                    ]
                }
            }
        })
    }

    fn text_message(id: &str, name: &str, runs: Value) -> Value {
        json!({
            "liveChatTextMessageRenderer": {
                "id": id,
                "timestampUsec": "1700000000123456",
                "authorName": { "simpleText": name },
                "authorExternalChannelId": "UC123",
                "message": { "runs": runs }
            }
        })
    }

    #[test]
    fn test_text_message_with_emoji_runs() {
        let resp = response(vec![text_message(
            "m1",
            "ApexCup01",
            json!([
                { "text": "HELLO " },
                { "emoji": { "emojiId": "🐷", "shortcuts": [":pig:"] } },
                { "emoji": { "emojiId": "UCxyz/abc", "shortcuts": [":_custom:"], "isCustomEmoji": true } },
                { "emoji": { "emojiId": "🍣" } }
            ]),
        )]);

        let events = parse_actions(&resp);
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.kind, EventKind::TextMessage);
        assert_eq!(event.id, "m1");
        assert_eq!(event.author.name, "ApexCup01");
        assert_eq!(event.author.channel_id, "UC123");
        assert_eq!(event.text, "HELLO :pig::_custom:🍣");
        assert_eq!(event.amount, None);
        assert_eq!(event.timestamp.timestamp_micros(), 1_700_000_000_123_456);
    }

    #[test]
    fn test_paid_sticker_and_membership() {
        let resp = response(vec![
            json!({
                "liveChatPaidMessageRenderer": {
                    "id": "p1",
                    "timestampUsec": "1700000000000000",
                    "authorName": { "simpleText": "rich" },
                    "purchaseAmountText": { "simpleText": "¥1,000" },
                    "currency": "JPY",
                    "headerBackgroundColor": 4293271831u32,
                    "message": { "runs": [{ "text": "take my money" }] }
                }
            }),
            json!({
                "liveChatPaidStickerRenderer": {
                    "id": "s1",
                    "timestampUsec": "1700000000000000",
                    "authorName": { "simpleText": "sticky" },
                    "purchaseAmountText": { "simpleText": "$2.00" }
                }
            }),
            json!({
                "liveChatMembershipItemRenderer": {
                    "id": "n1",
                    "timestampUsec": "1700000000000000",
                    "authorName": { "simpleText": "newbie" },
                    "headerSubtext": { "simpleText": "Welcome to the club!" }
                }
            }),
        ]);

        let events = parse_actions(&resp);
        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::SuperChat, EventKind::SuperSticker, EventKind::NewSponsor]
        );
        assert_eq!(events[0].amount.as_deref(), Some("¥1,000"));
        assert_eq!(events[0].amount_value, Some(1000.0));
        assert_eq!(events[0].currency.as_deref(), Some("JPY"));
        assert_eq!(events[0].bg_color, Some(0xFFE6_2117));
        assert_eq!(events[1].amount_value, Some(2.0));
        assert_eq!(events[1].currency, None);
        assert_eq!(events[2].amount_value, None);
        assert_eq!(events[0].text, "take my money");
        assert_eq!(events[1].text, "");
        assert_eq!(events[2].text, "Welcome to the club!");
    }

    #[test]
    fn test_placeholders_and_unknown_items_are_skipped() {
        let resp = response(vec![
            json!({ "liveChatPlaceholderItemRenderer": { "id": "x" } }),
            json!({ "liveChatSomethingNewRenderer": { "id": "y" } }),
            text_message("m2", "viewer", json!([{ "text": "hi" }])),
        ]);
        let events = parse_actions(&resp);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "m2");
    }

    #[test]
    fn test_message_without_author_is_dropped() {
        let resp = response(vec![json!({
            "liveChatTextMessageRenderer": {
                "id": "m3",
                "timestampUsec": "1700000000000000",
                "message": { "runs": [{ "text": "ghost" }] }
            }
        })]);
        assert!(parse_actions(&resp).is_empty());
    }

    #[test]
    fn test_author_badges() {
        let badge = |label: &str| {
            json!({ "liveChatAuthorBadgeRenderer": {
                "accessibility": { "accessibilityData": { "label": label } }
            }})
        };
        let renderer = json!({
            "authorName": { "simpleText": "mod" },
            "authorBadges": [badge("Moderator"), badge("Member (6 months)")]
        });
        let author = parse_author(&renderer).unwrap();
        assert!(author.is_chat_moderator);
        assert!(author.is_chat_sponsor);
        assert!(!author.is_chat_owner);
        assert!(!author.is_verified);
    }

    #[test]
    fn test_next_continuation() {
        let resp = response(vec![]);
        assert_eq!(
            next_continuation(&resp),
            Some(("next-token".to_string(), 5000))
        );

        let reload = json!({
            "continuationContents": { "liveChatContinuation": { "continuations": [
                { "reloadContinuationData": { "continuation": "reload" } }
            ]}}
        });
        assert_eq!(next_continuation(&reload), Some(("reload".to_string(), 0)));

        assert_eq!(next_continuation(&json!({})), None);
    }

    #[test]
    fn test_parse_watch_page() {
        let html = r#"<script>var ytInitialData = {"contents":{"twoColumnWatchNextResults":{"conversationBar":{"liveChatRenderer":{"continuations":[{"reloadContinuationData":{"continuation":"first-token"}}]}}}}};</script>
<script>ytcfg.set({"INNERTUBE_API_KEY":"AIzaKey","INNERTUBE_CONTEXT_CLIENT_VERSION":"2.20240101.00.00"});</script>"#;

        let data = parse_watch_page(html).unwrap();
        assert_eq!(
            data,
            InitialData {
                continuation: "first-token".to_string(),
                api_key: "AIzaKey".to_string(),
                client_version: "2.20240101.00.00".to_string(),
            }
        );
    }

    #[test]
    fn test_watch_page_without_live_chat() {
        let html = r#"<script>var ytInitialData = {"contents":{}};</script>"#;
        let err = parse_watch_page(html).unwrap_err();
        assert!(err.to_string().contains("continuation"));
    }
}

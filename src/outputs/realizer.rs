//! Pure text realization of agent turns, notifications and errors.

use crate::ast::Statement;
use crate::dialogue::{DialogueAct, DialogueState};
use crate::executor::{DialogueHistoryResultItem, DialogueHistoryResultList};

/// Rows spelled out when displaying a list of results.
const DISPLAYED_ROWS: usize = 3;

/// Renders one result row as `field: value` pairs, in field order.
pub fn describe_item(item: &DialogueHistoryResultItem) -> String {
    item.value
        .iter()
        .map(|(field, value)| format!("{}: {}", field.replace('_', " "), value))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `send message with to alice and then ...`, from function names and
/// parameter values.
pub fn describe_statement(stmt: &Statement) -> String {
    stmt.invocations()
        .map(|inv| {
            let name = inv.channel.replace('_', " ");
            if inv.in_params.is_empty() {
                return name;
            }
            let params: Vec<String> = inv
                .in_params
                .iter()
                .map(|p| format!("{} {}", p.name.replace('_', " "), p.value))
                .collect();
            format!("{} with {}", name, params.join(", "))
        })
        .collect::<Vec<_>>()
        .join(" and then ")
}

fn describe_results(results: &DialogueHistoryResultList) -> String {
    if results.count == 1 {
        if let Some(item) = results.results.first() {
            return format!("Here is the result: {}.", describe_item(item));
        }
    }

    let total = if results.more {
        format!("{} or more", results.count)
    } else {
        results.count.to_string()
    };
    let rows: Vec<String> = results
        .results
        .iter()
        .take(DISPLAYED_ROWS)
        .map(describe_item)
        .collect();
    format!(
        "I found {} results. Here are the first {}:\n{}",
        total,
        rows.len(),
        rows.join("\n")
    )
}

/// Text for the agent act chosen at the end of a turn.
pub fn realize_turn(state: &DialogueState) -> String {
    let current = state.current().and_then(|item| item.results.as_ref());

    match state.dialogue_act() {
        DialogueAct::Cancel => "Alright, I won't do that.".to_string(),
        DialogueAct::SysConfirmAction => match state.next() {
            Some(item) => format!("Okay, so you want me to {}. Is that right?", describe_statement(&item.stmt)),
            None => "Is that right?".to_string(),
        },
        DialogueAct::SysSlotFill => match state.dialogue_act_param().and_then(|p| p.first()) {
            Some(param) => format!("What {} do you want?", param.replace('_', " ")),
            None => "Can you be more specific?".to_string(),
        },
        DialogueAct::SysDisplayResult => match current {
            Some(results) => describe_results(results),
            None => "I have no results to show.".to_string(),
        },
        DialogueAct::SysEmptySearch => "Sorry, I cannot find any result matching your request.".to_string(),
        DialogueAct::SysActionSuccess => match current.and_then(|r| r.results.first()) {
            Some(item) if !item.value.is_empty() => {
                format!("The request was completed successfully: {}.", describe_item(item))
            }
            _ => "The request was completed successfully.".to_string(),
        },
        DialogueAct::SysActionError => match current.and_then(|r| r.error.as_ref()) {
            Some(error) => format!("Sorry, there was an error: {}.", error),
            None => "Sorry, there was an error.".to_string(),
        },
        DialogueAct::SysGeneric | DialogueAct::Execute => "Consider it done.".to_string(),
    }
}

/// Text for a background notification. The app header is only shown when
/// asked for.
pub fn realize_notification(app_name: &str, item: &DialogueHistoryResultItem, show_header: bool) -> String {
    let body = if item.value.is_empty() {
        "Notification received.".to_string()
    } else {
        describe_item(item)
    };
    if show_header {
        format!("Notification from {}: {}", app_name, body)
    } else {
        body
    }
}

pub fn realize_error(app_name: &str, message: &str) -> String {
    format!("{} had an error: {}", app_name, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Value;
    use std::collections::BTreeMap;

    fn row(field: &str, value: Value) -> DialogueHistoryResultItem {
        let mut map = BTreeMap::new();
        map.insert(field.to_string(), value);
        DialogueHistoryResultItem::new(map)
    }

    #[test]
    fn test_error_format() {
        assert_eq!(realize_error("twitter", "rate limited"), "twitter had an error: rate limited");
    }

    #[test]
    fn test_notification_header() {
        let item = row("temperature", Value::Measure { value: 21.0, unit: "C".into() });
        assert_eq!(
            realize_notification("weather", &item, true),
            "Notification from weather: temperature: 21 C"
        );
        assert_eq!(realize_notification("weather", &item, false), "temperature: 21 C");
    }

    #[test]
    fn test_many_results_mention_more() {
        let items = (0..12).map(|i| row("n", Value::Number(i as f64))).collect();
        let list = DialogueHistoryResultList::new(items, true, None);
        let text = describe_results(&list);
        assert!(text.starts_with("I found 12 or more results. Here are the first 3:"));
    }
}

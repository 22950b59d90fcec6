//! Visible subset and current exchange, derived from session state

use crate::session::SessionState;
use trafficscope_common::Exchange;

/// Exchanges matching the filter text, in session order.
///
/// An empty (or whitespace-only) filter yields every exchange.
pub fn filtered_requests(state: &SessionState) -> Vec<&Exchange> {
    let query = state.filter.trim().to_lowercase();
    if query.is_empty() {
        return state.requests.iter().collect();
    }

    state
        .requests
        .iter()
        .filter(|exchange| matches_query(exchange, &query))
        .collect()
}

/// Case-insensitive substring match over the searchable fields.
/// `query` must already be lower-cased.
pub fn matches_query(exchange: &Exchange, query: &str) -> bool {
    let status = exchange.effective_status();
    let status = if status > 0 {
        status.to_string()
    } else {
        String::new()
    };

    let haystack = [
        exchange.method.as_str(),
        exchange.url.as_str(),
        exchange.remote_address.as_str(),
        exchange.user_agent.as_str(),
        status.as_str(),
    ]
    .join(" ")
    .to_lowercase();

    haystack.contains(query)
}

/// The selected exchange, if any
pub fn current_selection(state: &SessionState) -> Option<&Exchange> {
    let id = state.selected_id.as_deref()?;
    state.requests.iter().find(|exchange| exchange.id == id)
}

//! Device detection

/// Phone-style user agents get compact items (`/Mobi|Android/i`)
pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    let ua = user_agent.to_ascii_lowercase();
    ua.contains("mobi") || ua.contains("android")
}

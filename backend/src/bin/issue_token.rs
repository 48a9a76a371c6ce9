//! Issues a bearer token for local development and manual API testing.
//!
//! Usage: `issue_token <role> [email] [user_id]`

use anyhow::{anyhow, Context};

use portal_backend::{
    config::Config, models::identity::UserRole, types::UserId, utils::jwt::create_access_token,
};

fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    let mut args = std::env::args().skip(1);

    let role: UserRole = args
        .next()
        .ok_or_else(|| anyhow!("usage: issue_token <user|approver|admin> [email] [user_id]"))?
        .parse()
        .map_err(|err: String| anyhow!(err))?;
    let email = args
        .next()
        .unwrap_or_else(|| format!("{}@example.com", role.as_str()));
    let user_id = match args.next() {
        Some(raw) => raw.parse::<UserId>().context("user_id must be a UUID")?,
        None => UserId::new(),
    };

    let token = create_access_token(
        user_id,
        email,
        role,
        &config.jwt_secret,
        config.jwt_expiration_hours,
    )?;
    eprintln!("user_id={} role={}", user_id, role.as_str());
    println!("{}", token);
    Ok(())
}

//! One-shot CLI commands
//!
//! Every command goes through a [`CrudSession`], so the CLI validates and
//! sequences exactly like the interactive console.

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::sync::Arc;
use tracing::{info, warn};
use unicode_width::UnicodeWidthStr;

use crate::cli::{PermissionCommand, UserCommand};
use crate::config::Config;
use crate::console::resource::TableRow;
use crate::console::{CrudSession, Field, Permissions, Resource, SessionError, Users};
use crate::gateway::{ConsoleGateway, DirectoryGateway, Gateway, HttpGateway};
use crate::locale::Locale;
use crate::models::{User, UserAppPermission};

/// Asks the operator to confirm a destructive action
pub type Confirm<'a> = &'a mut dyn FnMut(&str) -> Result<bool>;

/// Build the HTTP gateway and log in when credentials are configured
pub async fn connect(config: &Config) -> Result<HttpGateway> {
    let mut gateway = HttpGateway::from_config(config).context("Failed to create HTTP client")?;
    if gateway.access_token().is_none() {
        match &config.credentials {
            Some(credentials) => gateway
                .login(credentials)
                .await
                .with_context(|| format!("Failed to log in to {}", config.server_url))?,
            None => warn!("No access token or credentials configured; calls are anonymous"),
        }
    }
    Ok(gateway)
}

/// Turn a session error into a CLI error, listing every field error
fn report<W: Write>(out: &mut W, locale: &Locale, error: SessionError) -> anyhow::Error {
    if let SessionError::Invalid(errors) = &error {
        for (field, message) in errors.iter() {
            let _ = writeln!(out, "  {}: {}", locale.get(field.label_key()), message);
        }
        return anyhow::anyhow!("{} field(s) failed validation", errors.len());
    }
    anyhow::anyhow!(error)
}

/// Render the current page as an aligned table
pub fn print_page<R, G, W>(session: &CrudSession<R, G>, out: &mut W) -> Result<()>
where
    R: Resource,
    G: Gateway<R> + ?Sized,
    W: Write,
{
    let locale = session.locale();
    let columns = R::Item::columns();
    let header: Vec<String> = columns
        .iter()
        .map(|c| locale.get(c.label_key()).to_string())
        .collect();
    let rows: Vec<Vec<String>> = session
        .items()
        .iter()
        .map(|item| columns.iter().map(|c| item.cell(*c, locale)).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.width()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.width());
        }
    }
    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{}{}", cell, " ".repeat(width - cell.width())))
            .collect::<Vec<_>>()
            .join("  ")
    };

    writeln!(out, "{}", line(&header).trim_end())?;
    if rows.is_empty() {
        writeln!(out, "{}", locale.get("empty"))?;
    }
    for row in &rows {
        writeln!(out, "{}", line(row).trim_end())?;
    }

    let list = &session.screen.list;
    if list.pager_visible() {
        writeln!(
            out,
            "Page {}/{} ({} total)",
            list.page_no(),
            list.total_pages(),
            list.total_count()
        )?;
    }
    Ok(())
}

/// Search with filters and walk the pages until `predicate` matches
async fn locate<R, G>(
    session: &mut CrudSession<R, G>,
    filters: &[(Field, &str)],
    what: &str,
    predicate: impl Fn(&R::Item) -> bool,
) -> Result<R::Item>
where
    R: Resource,
    G: Gateway<R> + ?Sized,
{
    session.query(filters).await?;
    loop {
        if let Some(item) = session.find(&predicate) {
            return Ok(item);
        }
        let list = &session.screen.list;
        if list.page_no() >= list.total_pages() {
            bail!(SessionError::NotFound(what.to_string()));
        }
        let next = list.page_no() + 1;
        session.change_page(next).await?;
    }
}

pub async fn run_permissions<G, W>(
    gateway: Arc<G>,
    locale: Locale,
    command: &PermissionCommand,
    out: &mut W,
    confirm: Confirm<'_>,
) -> Result<()>
where
    G: ConsoleGateway + ?Sized,
    W: Write,
{
    let mut session = CrudSession::<Permissions, G>::new(gateway, locale);
    match command {
        PermissionCommand::List {
            username,
            app,
            paging,
        } => {
            session.screen.list.set_filter(Field::Username, username.as_deref().unwrap_or(""));
            session.screen.list.set_filter(Field::App, app.as_deref().unwrap_or(""));
            session.change_page(paging.page).await?;
            print_page(&session, out)?;
        }

        PermissionCommand::Add {
            username,
            app,
            modules,
            action,
        } => {
            let modules = modules.map(|m| m.to_string()).unwrap_or_default();
            let action = action.map(|a| a.to_string()).unwrap_or_default();
            let values = [
                (Field::Username, username.as_str()),
                (Field::App, app.as_str()),
                (Field::Modules, modules.as_str()),
                (Field::Action, action.as_str()),
            ];
            if let Err(e) = session.create(&values).await {
                return Err(report(out, session.locale(), e));
            }
            info!("Granted {} on {}", username, app);
            writeln!(out, "{}", session.locale().get("saved"))?;
        }

        PermissionCommand::Edit {
            username,
            app,
            modules,
            action,
        } => {
            let what = format!("permission {}@{}", username, app);
            let grant = locate(
                &mut session,
                &[(Field::Username, username.as_str()), (Field::App, app.as_str())],
                &what,
                |p: &UserAppPermission| p.username == *username && p.app == *app,
            )
            .await?;
            let modules = modules.map(|m| m.to_string());
            let action = action.map(|a| a.to_string());
            let mut values = Vec::new();
            if let Some(m) = &modules {
                values.push((Field::Modules, m.as_str()));
            }
            if let Some(a) = &action {
                values.push((Field::Action, a.as_str()));
            }
            if let Err(e) = session.edit(&grant, &values).await {
                return Err(report(out, session.locale(), e));
            }
            writeln!(out, "{}", session.locale().get("saved"))?;
        }

        PermissionCommand::Delete { username, app, yes } => {
            let what = format!("permission {}@{}", username, app);
            let grant = locate(
                &mut session,
                &[(Field::Username, username.as_str()), (Field::App, app.as_str())],
                &what,
                |p: &UserAppPermission| p.username == *username && p.app == *app,
            )
            .await?;
            delete(&mut session, grant, *yes, out, confirm).await?;
        }
    }
    Ok(())
}

pub async fn run_users<G, W>(
    gateway: Arc<G>,
    locale: Locale,
    command: &UserCommand,
    out: &mut W,
    confirm: Confirm<'_>,
) -> Result<()>
where
    G: ConsoleGateway + ?Sized,
    W: Write,
{
    let mut session = CrudSession::<Users, G>::new(gateway, locale);
    match command {
        UserCommand::List { username, paging } => {
            session.screen.list.set_filter(Field::Username, username.as_deref().unwrap_or(""));
            session.change_page(paging.page).await?;
            print_page(&session, out)?;
        }

        UserCommand::Add { username, password } => {
            let values = [
                (Field::Username, username.as_str()),
                (Field::Password, password.as_str()),
            ];
            if let Err(e) = session.create(&values).await {
                return Err(report(out, session.locale(), e));
            }
            info!("Created user {}", username);
            writeln!(out, "{}", session.locale().get("saved"))?;
        }

        UserCommand::Update { username, kps } => {
            let user = locate(
                &mut session,
                &[(Field::Username, username.as_str())],
                &format!("user {}", username),
                |u: &User| u.username == *username,
            )
            .await?;
            if let Err(e) = session.edit(&user, &[(Field::Kps, kps.as_str())]).await {
                return Err(report(out, session.locale(), e));
            }
            writeln!(out, "{}", session.locale().get("saved"))?;
        }

        UserCommand::Delete { username, yes } => {
            let user = locate(
                &mut session,
                &[(Field::Username, username.as_str())],
                &format!("user {}", username),
                |u: &User| u.username == *username,
            )
            .await?;
            delete(&mut session, user, *yes, out, confirm).await?;
        }
    }
    Ok(())
}

async fn delete<R, G, W>(
    session: &mut CrudSession<R, G>,
    item: R::Item,
    assume_yes: bool,
    out: &mut W,
    confirm: Confirm<'_>,
) -> Result<()>
where
    R: Resource,
    G: Gateway<R> + ?Sized,
    W: Write,
{
    let locale = session.locale();
    let prompt = format!(
        "{}: {} ({})",
        locale.get(R::DELETE_TITLE_KEY),
        locale.get(R::DELETE_TIP_KEY),
        R::describe(&item)
    );
    let confirmed = assume_yes || confirm(&prompt)?;
    let described = R::describe(&item);
    if session.delete(item, confirmed).await? {
        info!("Deleted {} {}", R::NAME, described);
        writeln!(out, "{}", session.locale().get("deleted"))?;
    } else {
        writeln!(out, "Cancelled")?;
    }
    Ok(())
}

pub async fn run_apps<G, W>(gateway: Arc<G>, out: &mut W) -> Result<()>
where
    G: ConsoleGateway + ?Sized,
    W: Write,
{
    let apps = gateway.list_apps().await.context("Failed to list apps")?;
    for app in apps {
        writeln!(out, "{}", app)?;
    }
    Ok(())
}

/// Prompt on stdin; anything but y/yes declines
pub fn confirm_on_stdin(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

//! CLI command implementations over the shared service wiring.

use std::io::{BufRead, Write};

use anyhow::{bail, Context};

use storekeep_api::app::services::AppServices;
use storekeep_auth::store::{AuthTransaction, AuthUnitOfWork, UserStore};
use storekeep_auth::{EmployeeRoleSync, ResourceType, User};
use storekeep_core::{EmployeeId, EmployeeRole};
use storekeep_infra::{CheckRepo, EmployeeRepo};

pub async fn create_user(
    services: &AppServices,
    username: &str,
    password: Option<String>,
    superuser: bool,
) -> anyhow::Result<()> {
    let password = match password {
        Some(password) => password,
        None => prompt("Password: ")?,
    };
    if password.trim().is_empty() {
        bail!("password must not be empty");
    }

    let user = services
        .authenticator
        .register(username, &password, superuser)
        .await
        .context("failed to create user")?;

    let kind = if superuser { "Superuser" } else { "User" };
    println!("{kind} {:?} created (id={})", user.username, user.id);
    Ok(())
}

pub async fn sync_permissions(services: &AppServices) -> anyhow::Result<()> {
    println!("Creating basic permissions for all resource types...");
    for resource in ResourceType::ALL {
        let (_, created) = services
            .catalog
            .ensure_basic_permissions(&resource)
            .await
            .with_context(|| format!("failed to create permissions for {resource}"))?;
        let note = if created { "Done." } else { "Already exists." };
        println!("  {resource}: {note}");
    }

    for role in [EmployeeRole::Cashier, EmployeeRole::Manager] {
        let group = services
            .roles
            .ensure_role_group(role)
            .await
            .with_context(|| format!("failed to materialize role group for {role}"))?;
        println!("  role group {:?}: ready", group.name);
    }

    Ok(())
}

pub async fn assign_employee(
    services: &AppServices,
    username: &str,
    employee_id: &str,
) -> anyhow::Result<()> {
    let user = find_user(services, username).await?;
    let employee_id = EmployeeId::new(employee_id)?;

    let employee = services
        .employees
        .get(&employee_id)
        .await
        .context("failed to load employee")?
        .with_context(|| format!("employee {employee_id} not found"))?;

    let tx = services.uow.begin().await.context("failed to open transaction")?;
    let sync = EmployeeRoleSync::from_stores(&tx.stores(), services.cache.clone());
    let user = sync
        .assign(&user, employee.id.clone(), employee.role)
        .await
        .context("failed to assign employee")?;
    tx.commit().await.context("failed to commit")?;

    println!(
        "Assigned employee {} {} ({}) to user {:?}",
        employee.surname, employee.name, employee.id, user.username
    );
    Ok(())
}

pub async fn deassign_employee(services: &AppServices, username: &str) -> anyhow::Result<()> {
    let user = find_user(services, username).await?;

    let tx = services.uow.begin().await.context("failed to open transaction")?;
    let sync = EmployeeRoleSync::from_stores(&tx.stores(), services.cache.clone());
    let user = sync.remove(&user).await.context("failed to deassign employee")?;
    tx.commit().await.context("failed to commit")?;

    println!("Cleared employee link for user {:?}", user.username);
    Ok(())
}

pub async fn clear_checks(services: &AppServices, yes: bool) -> anyhow::Result<()> {
    let numbers = services
        .checks
        .list_numbers()
        .await
        .context("failed to list checks")?;

    if numbers.is_empty() {
        println!("No checks to delete.");
        return Ok(());
    }

    if !yes {
        let answer = prompt(&format!("Delete {} checks? [y/N] ", numbers.len()))?;
        if !matches!(answer.trim(), "y" | "Y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    services
        .checks
        .delete_many(&numbers)
        .await
        .context("failed to delete checks")?;

    println!("Deleted {} checks.", numbers.len());
    Ok(())
}

async fn find_user(services: &AppServices, username: &str) -> anyhow::Result<User> {
    services
        .auth_stores
        .users
        .find_by_username(username)
        .await
        .context("failed to look up user")?
        .with_context(|| format!("user {username:?} not found"))
}

fn prompt(message: &str) -> anyhow::Result<String> {
    print!("{message}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

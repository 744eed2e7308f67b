//! `outreach contacts` command - browse stored contacts

use chrono::{Local, NaiveDate};
use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{format_short_id, open_workspace, truncate_str};
use crate::cli::GlobalOpts;
use crate::core::store::ContactStore;
use crate::entities::contact::{Contact, ContactStatus};

#[derive(Subcommand, Debug)]
pub enum ContactsCommands {
    /// List contacts with optional filtering
    List(ListArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by status ("Not Started", "Reached Out", "Responded", "Chatted")
    #[arg(long, short = 's', value_parser = parse_status)]
    pub status: Option<ContactStatus>,

    /// Filter by tag (case-insensitive)
    #[arg(long, short = 't')]
    pub tag: Option<String>,

    /// Search name, email, company and role
    #[arg(long)]
    pub search: Option<String>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

fn parse_status(s: &str) -> Result<ContactStatus, String> {
    s.parse()
}

/// Criteria for narrowing a contact listing
#[derive(Debug, Default)]
struct ContactFilter {
    status: Option<ContactStatus>,
    tag: Option<String>,
    search: Option<String>,
}

impl ContactFilter {
    fn matches(&self, contact: &Contact) -> bool {
        if self.status.is_some_and(|s| s != contact.status) {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !contact.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                return false;
            }
        }
        if let Some(query) = &self.search {
            let query = query.to_lowercase();
            let haystack = [
                Some(contact.name.as_str()),
                contact.email.as_deref(),
                contact.company.as_deref(),
                contact.role.as_deref(),
            ];
            if !haystack
                .iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&query))
            {
                return false;
            }
        }
        true
    }
}

pub fn run(cmd: ContactsCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ContactsCommands::List(args) => run_list(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let (_workspace, config, store) = open_workspace(global)?;
    let owner = config.owner();

    let filter = ContactFilter {
        status: args.status,
        tag: args.tag,
        search: args.search,
    };
    let mut contacts: Vec<Contact> = store
        .list_contacts(&owner)
        .map_err(|e| miette::miette!("{}", e))?
        .into_iter()
        .filter(|c| filter.matches(c))
        .collect();
    if let Some(limit) = args.limit {
        contacts.truncate(limit);
    }

    if global.is_json() {
        let json = serde_json::to_string_pretty(&contacts).into_diagnostic()?;
        println!("{}", json);
        return Ok(());
    }

    if global.quiet {
        for contact in &contacts {
            println!("{}", contact.id);
        }
        return Ok(());
    }

    if contacts.is_empty() {
        println!("No contacts found.");
        return Ok(());
    }

    println!("{}", render_table(&contacts, Local::now().date_naive()));
    println!();
    println!(
        "{} contact(s) found for {}",
        style(contacts.len()).cyan(),
        style(&owner).cyan()
    );
    Ok(())
}

fn render_table(contacts: &[Contact], today: NaiveDate) -> String {
    let mut table = Builder::default();
    table.push_record([
        "ID", "Name", "Email", "Company", "Role", "Status", "Tags", "Contacted", "Days",
    ]);
    for contact in contacts {
        table.push_record([
            format_short_id(&contact.id),
            truncate_str(&contact.name, 24),
            truncate_str(contact.email.as_deref().unwrap_or("-"), 28),
            truncate_str(contact.company.as_deref().unwrap_or("-"), 20),
            truncate_str(contact.role.as_deref().unwrap_or("-"), 20),
            contact.status.to_string(),
            truncate_str(&contact.tags.join(", "), 24),
            contact.date_of_contact.format("%Y-%m-%d").to_string(),
            contact.days_since_contact(today).to_string(),
        ]);
    }
    table.build().with(Style::rounded()).to_string()
}

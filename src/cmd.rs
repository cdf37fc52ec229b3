//! Command implementations for the CLI interface.
//!
//! Each handler loads the relevant page controller, applies one action and
//! prints the result. Service failures surface as notices; only unknown ids
//! and invalid input are returned as errors.

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::Local;
use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::backend::Services;
use crate::category::{Category, CategoryDraft, CategoryPatch};
use crate::client::Client;
use crate::fields::{format_due_relative, DirectorySort, Priority, TaskSort};
use crate::fixtures::Fixtures;
use crate::form::{ClientForm, EntityForm, FormErrors, ProjectField, ProjectForm, TaskField, TaskForm};
use crate::page::{ClientsPage, LoadState, ProjectsPage, TaskManager};
use crate::project::Project;
use crate::task::Task;

#[derive(Subcommand)]
pub enum Commands {
    /// Manage tasks.
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Manage task categories.
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Manage clients.
    Client {
        #[command(subcommand)]
        action: ClientAction,
    },

    /// Manage projects.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Write the built-in sample data to a file.
    Seed {
        #[arg(long)]
        output: PathBuf,
    },

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Commands {
    /// Whether running the command can change stored records.
    pub fn mutates(&self) -> bool {
        match self {
            Commands::Task { action } => !matches!(action, TaskAction::List { .. } | TaskAction::View { .. }),
            Commands::Category { action } => !matches!(action, CategoryAction::List),
            Commands::Client { action } => {
                !matches!(action, ClientAction::List { .. } | ClientAction::View { .. } | ClientAction::Tags)
            }
            Commands::Project { action } => {
                !matches!(action, ProjectAction::List { .. } | ProjectAction::View { .. } | ProjectAction::Tags)
            }
            Commands::Seed { .. } | Commands::Completions { .. } => false,
        }
    }
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// List active tasks, or completed ones with --completed.
    List {
        /// Case-insensitive text matched against title, description and project.
        #[arg(long)]
        search: Option<String>,
        /// Only tasks in this category.
        #[arg(long)]
        category: Option<String>,
        #[arg(long, value_enum, default_value_t = TaskSort::CreatedAt)]
        sort: TaskSort,
        /// Show the completed tasks instead of the active ones.
        #[arg(long)]
        completed: bool,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Add a task with full details.
    Add {
        title: String,
        #[arg(long)]
        desc: Option<String>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "friday", "in 3d".
        #[arg(long)]
        due: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        project: Option<String>,
    },

    /// Add a task from a title alone.
    Quick {
        #[arg(required = true, num_args = 1..)]
        words: Vec<String>,
    },

    /// Show one task.
    View { id: u64 },

    /// Change fields on a task.
    Update {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        project: Option<String>,
    },

    /// Mark a task done, or reopen a done one.
    Toggle { id: u64 },

    Delete { id: u64 },
}

#[derive(Subcommand)]
pub enum CategoryAction {
    /// List categories with the number of tasks in each.
    List,

    Add {
        name: String,
        /// UI color token, e.g. "#10B981".
        #[arg(long)]
        color: Option<String>,
    },

    Update {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },

    Delete { id: u64 },
}

#[derive(Subcommand)]
pub enum ClientAction {
    List {
        /// Case-insensitive text matched against name and contact details.
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, value_enum, default_value_t = DirectorySort::CreatedAt)]
        sort: DirectorySort,
    },

    Add {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        company: Option<String>,
        /// Comma-separated tags.
        #[arg(long)]
        tags: Option<String>,
    },

    View { id: u64 },

    Update {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        tags: Option<String>,
    },

    Delete { id: u64 },

    /// List every tag in use.
    Tags,
}

#[derive(Subcommand)]
pub enum ProjectAction {
    List {
        /// Case-insensitive text matched against name and description.
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, value_enum, default_value_t = DirectorySort::CreatedAt)]
        sort: DirectorySort,
    },

    Add {
        name: String,
        #[arg(long)]
        desc: Option<String>,
        /// Comma-separated tags.
        #[arg(long)]
        tags: Option<String>,
    },

    View { id: u64 },

    Update {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        tags: Option<String>,
    },

    Delete { id: u64 },

    /// List every tag in use.
    Tags,
}

/// Run one data command against `services`.
pub async fn run(command: Commands, services: &Services) -> Result<()> {
    match command {
        Commands::Task { action } => cmd_task(action, services).await,
        Commands::Category { action } => cmd_category(action, services).await,
        Commands::Client { action } => cmd_client(action, services).await,
        Commands::Project { action } => cmd_project(action, services).await,
        Commands::Seed { output } => cmd_seed(&output),
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

/// A page whose load failed has nothing to act on. The cause is already a notice.
fn ensure_loaded(state: LoadState) -> Result<()> {
    if state.is_failed() {
        bail!("Could not load records. Run the command again to retry.");
    }
    Ok(())
}

fn invalid(errors: &FormErrors) -> anyhow::Error {
    let messages: Vec<&str> = errors.iter().map(|(_, message)| message).collect();
    anyhow::anyhow!(messages.join("; "))
}

async fn cmd_task(action: TaskAction, services: &Services) -> Result<()> {
    let mut page = TaskManager::new(services.tasks.clone(), services.categories.clone(), services.notices.clone());
    page.load().await;
    ensure_loaded(page.state())?;

    match action {
        TaskAction::List { search, category, sort, completed, limit } => {
            page.set_search(search.unwrap_or_default());
            page.set_category(category);
            page.set_sort(sort);
            let mut rows = if completed { page.completed_view() } else { page.active_view() };
            if let Some(n) = limit {
                rows.truncate(n);
            }
            print_tasks(&rows);
            let counts = page.counts();
            println!("\n{} active, {} completed", counts.active, counts.completed);
        }

        TaskAction::Add { title, desc, due, priority, category, project } => {
            let mut form = page.open_new();
            form.edit(TaskField::Title, title);
            if let Some(v) = desc { form.edit(TaskField::Description, v); }
            if let Some(v) = due { form.edit(TaskField::Due, v); }
            if let Some(v) = category { form.edit(TaskField::Category, v); }
            if let Some(v) = project { form.edit(TaskField::Project, v); }
            if let Some(p) = priority { form.set_priority(p); }
            save_task(&mut page, &mut form).await?;
        }

        TaskAction::Quick { words } => {
            let text = words.join(" ");
            if let Some(task) = page.quick_add(&text).await {
                println!("Added task {}: {}", task.id, task.title);
            } else if text.trim().is_empty() {
                bail!("Nothing to add");
            }
        }

        TaskAction::View { id } => {
            let Some(task) = page.task(id) else { bail!("Task {id} not found") };
            print_task_detail(task);
        }

        TaskAction::Update { id, title, desc, due, clear_due, priority, category, project } => {
            let Some(mut form) = page.open_edit(id) else { bail!("Task {id} not found") };
            if let Some(v) = title { form.edit(TaskField::Title, v); }
            if let Some(v) = desc { form.edit(TaskField::Description, v); }
            if let Some(v) = due { form.edit(TaskField::Due, v); }
            if clear_due { form.edit(TaskField::Due, ""); }
            if let Some(v) = category { form.edit(TaskField::Category, v); }
            if let Some(v) = project { form.edit(TaskField::Project, v); }
            if let Some(p) = priority { form.set_priority(p); }
            save_task(&mut page, &mut form).await?;
        }

        TaskAction::Toggle { id } => {
            if page.task(id).is_none() {
                bail!("Task {id} not found");
            }
            if let Some(task) = page.toggle_complete(id).await {
                if page.take_celebration() {
                    println!("🎉 {} is done", task.title);
                } else {
                    println!("Reopened task {}: {}", task.id, task.title);
                }
            }
        }

        TaskAction::Delete { id } => {
            if page.task(id).is_none() {
                bail!("Task {id} not found");
            }
            page.delete(id).await;
        }
    }
    Ok(())
}

async fn save_task(page: &mut TaskManager, form: &mut TaskForm) -> Result<()> {
    match page.save(form).await {
        Some(task) => print_task_detail(&task),
        None if !form.errors().is_empty() => return Err(invalid(form.errors())),
        None => {}
    }
    Ok(())
}

async fn cmd_category(action: CategoryAction, services: &Services) -> Result<()> {
    let categories = &services.categories;
    match action {
        CategoryAction::List => {
            let mut page =
                TaskManager::new(services.tasks.clone(), categories.clone(), services.notices.clone());
            page.load().await;
            ensure_loaded(page.state())?;
            print_categories(&page.category_counts());
        }
        CategoryAction::Add { name, color } => {
            if name.trim().is_empty() {
                bail!("Category name is required");
            }
            let draft = CategoryDraft { name: name.trim().to_string(), color };
            if let Some(category) = categories.create(draft).await {
                println!("Added category {}: {}", category.id, category.name);
            }
        }
        CategoryAction::Update { id, name, color } => {
            let name = name.map(|n| n.trim().to_string());
            if name.as_deref() == Some("") {
                bail!("Category name is required");
            }
            if categories.get_by_id(id).await.is_none() {
                bail!("Category {id} not found");
            }
            let patch = CategoryPatch { name, color, ..Default::default() };
            if let Some(category) = categories.update(id, patch).await {
                println!("Updated category {}: {} {}", category.id, category.name, category.color);
            }
        }
        CategoryAction::Delete { id } => {
            if categories.get_by_id(id).await.is_none() {
                bail!("Category {id} not found");
            }
            if categories.delete(id).await {
                println!("Deleted category {id}");
            }
        }
    }
    Ok(())
}

async fn cmd_client(action: ClientAction, services: &Services) -> Result<()> {
    let mut page = ClientsPage::new(services.clients.clone(), services.notices.clone());
    page.load().await;
    ensure_loaded(page.state())?;

    match action {
        ClientAction::List { search, tag, sort } => {
            page.set_search(search.unwrap_or_default());
            page.set_tag(tag);
            page.set_sort(sort);
            print_clients(&page.view());
        }
        ClientAction::Add { name, email, phone, company, tags } => {
            page.open_new();
            let mut form = ClientForm::new();
            fill_client(&mut form, name, email, phone, company, tags);
            if let Some(client) = page.save(&mut form).await {
                print_client_detail(&client);
            }
        }
        ClientAction::View { id } => {
            let Some(client) = page.record(id) else { bail!("Client {id} not found") };
            print_client_detail(client);
        }
        ClientAction::Update { id, name, email, phone, company, tags } => {
            let Some(client) = page.open_edit(id) else { bail!("Client {id} not found") };
            let mut form = ClientForm::from_client(client);
            fill_client(&mut form, name, email, phone, company, tags);
            if let Some(client) = page.save(&mut form).await {
                print_client_detail(&client);
            }
        }
        ClientAction::Delete { id } => {
            if page.record(id).is_none() {
                bail!("Client {id} not found");
            }
            page.delete(id).await;
        }
        ClientAction::Tags => print_tags(&page.tags()),
    }
    Ok(())
}

fn fill_client(
    form: &mut ClientForm,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    company: Option<String>,
    tags: Option<String>,
) {
    if let Some(v) = name { form.name = v; }
    if let Some(v) = email { form.email = v; }
    if let Some(v) = phone { form.phone = v; }
    if let Some(v) = company { form.company = v; }
    if let Some(v) = tags { form.tags = v; }
}

async fn cmd_project(action: ProjectAction, services: &Services) -> Result<()> {
    let mut page = ProjectsPage::new(services.projects.clone(), services.notices.clone());
    page.load().await;
    ensure_loaded(page.state())?;

    match action {
        ProjectAction::List { search, tag, sort } => {
            page.set_search(search.unwrap_or_default());
            page.set_tag(tag);
            page.set_sort(sort);
            print_projects(&page.view());
        }
        ProjectAction::Add { name, desc, tags } => {
            page.open_new();
            let mut form = ProjectForm::new();
            form.edit(ProjectField::Name, name);
            if let Some(v) = desc { form.edit(ProjectField::Description, v); }
            if let Some(v) = tags { form.edit(ProjectField::Tags, v); }
            save_project(&mut page, &mut form).await?;
        }
        ProjectAction::View { id } => {
            let Some(project) = page.record(id) else { bail!("Project {id} not found") };
            print_project_detail(project);
        }
        ProjectAction::Update { id, name, desc, tags } => {
            let Some(project) = page.open_edit(id) else { bail!("Project {id} not found") };
            let mut form = ProjectForm::from_project(project);
            if let Some(v) = name { form.edit(ProjectField::Name, v); }
            if let Some(v) = desc { form.edit(ProjectField::Description, v); }
            if let Some(v) = tags { form.edit(ProjectField::Tags, v); }
            save_project(&mut page, &mut form).await?;
        }
        ProjectAction::Delete { id } => {
            if page.record(id).is_none() {
                bail!("Project {id} not found");
            }
            page.delete(id).await;
        }
        ProjectAction::Tags => print_tags(&page.tags()),
    }
    Ok(())
}

async fn save_project(page: &mut ProjectsPage, form: &mut ProjectForm) -> Result<()> {
    match page.save(form).await {
        Some(project) => print_project_detail(&project),
        None if !form.errors().is_empty() => return Err(invalid(form.errors())),
        None => {}
    }
    Ok(())
}

fn cmd_seed(output: &std::path::Path) -> Result<()> {
    Fixtures::builtin()?.save(output)?;
    println!("Wrote sample data to {}", output.display());
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

/// Truncate to `width` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() { "-" } else { s }
}

pub fn print_tasks(tasks: &[&Task]) {
    println!(
        "{:<5} {:<7} {:<10} {:<12} {:<16} {}",
        "ID", "Pri", "Due", "Category", "Project", "Title"
    );
    let today = Local::now().date_naive();
    for t in tasks {
        println!(
            "{:<5} {:<7} {:<10} {:<12} {:<16} {}",
            t.id,
            t.priority.as_str(),
            format_due_relative(t.due_date, today),
            truncate(&t.category, 12),
            truncate(&t.project, 16),
            t.title
        );
    }
}

fn print_task_detail(t: &Task) {
    let today = Local::now().date_naive();
    println!("ID:          {}", t.id);
    println!("Title:       {}", t.title);
    println!("Description: {}", or_dash(&t.description));
    match t.due_date {
        Some(d) => println!("Due:         {} ({})", d, format_due_relative(Some(d), today)),
        None => println!("Due:         -"),
    }
    println!("Priority:    {}", t.priority.as_str());
    println!("Category:    {}", t.category);
    println!("Project:     {}", t.project);
    match t.completed_at {
        Some(at) => println!("Completed:   {}", at.with_timezone(&Local).format("%Y-%m-%d %H:%M")),
        None => println!("Completed:   no"),
    }
    println!("Created:     {}", t.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    println!("Updated:     {}", t.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
}

fn print_categories(rows: &[(&Category, usize)]) {
    println!("{:<5} {:<16} {:<9} {}", "ID", "Name", "Color", "Tasks");
    for (c, count) in rows {
        println!("{:<5} {:<16} {:<9} {}", c.id, truncate(&c.name, 16), c.color, count);
    }
}

pub fn print_clients(clients: &[&Client]) {
    println!(
        "{:<5} {:<20} {:<24} {:<14} {:<16} {}",
        "ID", "Name", "Email", "Phone", "Company", "Tags"
    );
    for c in clients {
        println!(
            "{:<5} {:<20} {:<24} {:<14} {:<16} {}",
            c.id,
            truncate(c.display_name(), 20),
            truncate(or_dash(&c.contact.email), 24),
            truncate(or_dash(&c.contact.phone), 14),
            truncate(or_dash(&c.contact.company), 16),
            c.tag_list().join(", ")
        );
    }
}

fn print_client_detail(c: &Client) {
    println!("ID:       {}", c.id);
    println!("Name:     {}", c.display_name());
    println!("Email:    {}", or_dash(&c.contact.email));
    println!("Phone:    {}", or_dash(&c.contact.phone));
    println!("Company:  {}", or_dash(&c.contact.company));
    println!("Tags:     {}", or_dash(&c.tag_list().join(", ")));
    if let Some(at) = c.created_on {
        println!("Created:  {}", at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    }
}

pub fn print_projects(projects: &[&Project]) {
    println!("{:<5} {:<24} {:<20} {}", "ID", "Name", "Tags", "Description");
    for p in projects {
        println!(
            "{:<5} {:<24} {:<20} {}",
            p.id,
            truncate(&p.name, 24),
            truncate(&p.tag_list().join(","), 20),
            or_dash(&p.description)
        );
    }
}

fn print_project_detail(p: &Project) {
    println!("ID:          {}", p.id);
    println!("Name:        {}", p.name);
    println!("Description: {}", or_dash(&p.description));
    println!("Tags:        {}", or_dash(&p.tag_list().join(", ")));
    if let Some(at) = p.created_on {
        println!("Created:     {}", at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    }
}

fn print_tags(tags: &[String]) {
    if tags.is_empty() {
        println!("No tags");
    }
    for tag in tags {
        println!("{tag}");
    }
}

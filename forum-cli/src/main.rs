use std::fs;
use std::io;
use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use forum_client::{
    AuthResponse, ForumClient, ForumClientError, FormPage, Group, Page, Post, Submission,
};
use serde::Serialize;

const TOKEN_FILE: &str = ".forum_token";
const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";
const SERVER_ENV: &str = "FORUM_SERVER";

#[derive(Debug, Parser)]
#[command(name = "forum-cli", version, about = "CLI клиент для forum-server")]
struct Cli {
    /// Адрес сервера (по умолчанию `FORUM_SERVER` или http://127.0.0.1:8080).
    #[arg(long, global = true)]
    server: Option<String>,

    /// Печатать ответы сервера как JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Регистрация пользователя.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Вход пользователя.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Главная лента.
    Index {
        #[arg(long)]
        page: Option<u32>,
    },
    /// Лента группы.
    Group {
        #[arg(long)]
        slug: String,
        #[arg(long)]
        page: Option<u32>,
    },
    /// Профиль автора.
    Profile {
        #[arg(long)]
        username: String,
        #[arg(long)]
        page: Option<u32>,
    },
    /// Получение поста автора по id.
    Get {
        #[arg(long)]
        username: String,
        #[arg(long)]
        id: i64,
    },
    /// Список групп для формы поста (требует токен).
    Groups,
    /// Создание поста (требует токен).
    Create {
        #[arg(long)]
        text: String,
        /// Id группы.
        #[arg(long)]
        group: Option<i64>,
    },
    /// Редактирование поста (требует токен).
    ///
    /// Не указанные поля берутся из текущего поста.
    Edit {
        #[arg(long)]
        username: String,
        #[arg(long)]
        id: i64,
        #[arg(long)]
        text: Option<String>,
        /// Id группы.
        #[arg(long, conflicts_with = "no_group")]
        group: Option<i64>,
        /// Убрать пост из группы.
        #[arg(long)]
        no_group: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Ошибка: {err}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let server = resolve_server(cli.server.or_else(|| std::env::var(SERVER_ENV).ok()));
    let mut client = ForumClient::new(server).map_err(map_client_error)?;

    if let Some(token) = load_token().context("не удалось прочитать .forum_token")? {
        client.set_token(token);
    }

    let out = Output { json: cli.json };

    match cli.command {
        Command::Register {
            username,
            email,
            password,
        } => {
            let auth = client
                .register(&username, &email, &password)
                .await
                .map_err(map_client_error)?;
            persist_token(&client).context("не удалось сохранить токен")?;
            out.emit(&auth, || print_auth("Регистрация успешна", &auth))?;
        }
        Command::Login { username, password } => {
            let auth = client
                .login(&username, &password)
                .await
                .map_err(map_client_error)?;
            persist_token(&client).context("не удалось сохранить токен")?;
            out.emit(&auth, || print_auth("Вход выполнен", &auth))?;
        }
        Command::Index { page } => {
            let index = client.index(page).await.map_err(map_client_error)?;
            out.emit(&index, || print_page("Лента", &index.page))?;
        }
        Command::Group { slug, page } => {
            let feed = client
                .group_feed(&slug, page)
                .await
                .map_err(map_client_error)?;
            out.emit(&feed, || {
                print_page(&format!("Группа «{}» ({})", feed.group.title, feed.group.slug), &feed.page)
            })?;
        }
        Command::Profile { username, page } => {
            let profile = client
                .profile(&username, page)
                .await
                .map_err(map_client_error)?;
            out.emit(&profile, || {
                print_page(
                    &format!("{} (постов: {})", profile.author.username, profile.post_count),
                    &profile.page,
                )
            })?;
        }
        Command::Get { username, id } => {
            let post = client
                .get_post(&username, id)
                .await
                .map_err(map_client_error)?;
            out.emit(&post, || {
                print_post("Пост", &post.post);
                println!("posts by author: {}", post.post_count);
            })?;
        }
        Command::Groups => {
            let groups = client.groups().await.map_err(map_client_error)?;
            out.emit(&groups, || print_groups(&groups))?;
        }
        Command::Create { text, group } => {
            let submission = client
                .create_post(&text, group)
                .await
                .map_err(map_client_error)?;
            report_submission("Пост создан", submission)?;
        }
        Command::Edit {
            username,
            id,
            text,
            group,
            no_group,
        } => {
            let current = if text.is_none() || (group.is_none() && !no_group) {
                Some(client.edit_form(&username, id).await.map_err(map_client_error)?)
            } else {
                None
            };
            let (text, group) = merge_edit(current.as_ref(), text, group, no_group)?;

            let submission = client
                .edit_post(&username, id, &text, group)
                .await
                .map_err(map_client_error)?;
            report_submission("Пост обновлён", submission)?;
        }
    }

    Ok(())
}

struct Output {
    json: bool,
}

impl Output {
    fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce()) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human();
        }
        Ok(())
    }
}

/// Поля, не переданные в `edit`, берутся из формы с текущими значениями поста.
fn merge_edit(
    current: Option<&FormPage>,
    text: Option<String>,
    group: Option<i64>,
    no_group: bool,
) -> Result<(String, Option<i64>)> {
    let text = match text {
        Some(text) => text,
        None => current
            .map(|form| form.form.text.clone())
            .context("нет текущего текста поста")?,
    };

    let group = if no_group {
        None
    } else if group.is_some() {
        group
    } else {
        current
            .and_then(|form| form.form.group.as_deref())
            .filter(|raw| !raw.is_empty())
            .map(|raw| raw.parse::<i64>())
            .transpose()
            .context("сервер вернул некорректную группу")?
    };

    Ok((text, group))
}

fn report_submission(success: &str, submission: Submission) -> Result<()> {
    match submission {
        Submission::Redirected(location) => {
            println!("{success}: {location}");
            Ok(())
        }
        Submission::Rejected(form) => {
            for (field, messages) in &form.errors {
                for message in messages {
                    eprintln!("{field}: {message}");
                }
            }
            anyhow::bail!("форма отклонена сервером")
        }
    }
}

fn resolve_server(server: Option<String>) -> String {
    normalize_server(server.unwrap_or_else(|| DEFAULT_SERVER.to_string()))
}

fn normalize_server(server: String) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        return server;
    }

    format!("http://{server}")
}

fn parse_token_content(raw: &str) -> Option<String> {
    let token = raw.trim().to_string();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn load_token() -> io::Result<Option<String>> {
    if !Path::new(TOKEN_FILE).exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(TOKEN_FILE)?;
    Ok(parse_token_content(&raw))
}

fn persist_token(client: &ForumClient) -> io::Result<()> {
    if let Some(token) = client.get_token() {
        fs::write(TOKEN_FILE, token)?;
    }
    Ok(())
}

fn map_client_error(err: ForumClientError) -> anyhow::Error {
    let message = match err {
        ForumClientError::Unauthorized => {
            "требуется авторизация: выполните `forum-cli login ...` или `forum-cli register ...`"
                .to_string()
        }
        ForumClientError::NotFound => "ресурс не найден".to_string(),
        ForumClientError::InvalidRequest(message) => format!("некорректный запрос: {message}"),
        ForumClientError::UnexpectedResponse(message) => {
            format!("неожиданный ответ сервера: {message}")
        }
        ForumClientError::Http(err) => format!("ошибка HTTP: {err}"),
    };
    anyhow::anyhow!(message)
}

fn print_auth(title: &str, auth: &AuthResponse) {
    println!("{title}");
    println!("token: {}", auth.access_token);
    println!("user:");
    println!("  id: {}", auth.user.id);
    println!("  username: {}", auth.user.username);
    println!("  email: {}", auth.user.email);
    println!("  created_at: {}", auth.user.created_at);
}

fn print_post(title: &str, post: &Post) {
    println!("{title}");
    println!("id: {}", post.id);
    println!("author: {}", post.author.username);
    if let Some(group) = &post.group {
        println!("group: {} ({})", group.title, group.slug);
    }
    println!("created_at: {}", post.created_at);
    println!("text: {}", post.text);
}

fn print_page(title: &str, page: &Page) {
    println!(
        "{title}: страница {}/{}, постов {} из {}",
        page.number, page.num_pages, page.object_count, page.count
    );

    for post in &page.posts {
        println!(
            "- [{}] {}: {}",
            post.id,
            post.author.username,
            post.text.lines().next().unwrap_or_default()
        );
    }
}

fn print_groups(groups: &[Group]) {
    for group in groups {
        println!("- [{}] {} ({})", group.id, group.title, group.slug);
    }
}

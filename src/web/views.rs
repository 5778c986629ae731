//! Server-rendered HTML pages.
//!
//! Every page goes through [`layout`], which shows the flash message and the
//! role-aware navigation. All user-supplied text is escaped here.

use std::fmt::Write;

use crate::datetime::format_for_display;
use crate::db::{Role, User};
use crate::file::SharedFile;
use crate::html::escape;
use crate::web::forms::{AccountForm, FileCreateForm, FormErrors, LoginForm, SignupForm, UserEditForm};
use crate::web::middleware::Principal;

/// Per-request data every page needs.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    /// Message queued by the previous request.
    pub flash: Option<String>,
    /// Token embedded in every form.
    pub csrf_token: String,
    /// Who is looking.
    pub principal: Principal,
    /// Timezone for dates.
    pub timezone: String,
}

impl PageContext {
    fn csrf_field(&self) -> String {
        format!(
            r#"<input type="hidden" name="csrf_token" value="{}">"#,
            escape(&self.csrf_token)
        )
    }

    fn date(&self, stored: &str) -> String {
        escape(&format_for_display(stored, &self.timezone))
    }
}

const STYLE: &str = "body{font-family:sans-serif;max-width:60rem;margin:0 auto;padding:1rem}\
nav{display:flex;gap:1rem;align-items:center;border-bottom:1px solid #ccc;padding-bottom:.5rem}\
nav form{margin-left:auto}\
.flash{background:#e6f4ea;border:1px solid #9c9;padding:.5rem;margin:1rem 0}\
.error{color:#b00020}\
table{border-collapse:collapse;width:100%}\
td,th{border-bottom:1px solid #ddd;padding:.4rem;text-align:left}\
label{display:block;margin-top:.75rem}";

fn nav(ctx: &PageContext) -> String {
    let mut links = String::from(r#"<a href="/">Home</a>"#);
    match &ctx.principal {
        Principal::Anonymous => {
            links.push_str(r#"<a href="/user/signup">Signup</a><a href="/user/login">Login</a>"#);
        }
        Principal::Authenticated(user) => {
            if user.role != Role::Guest {
                links.push_str(r#"<a href="/files/create">Share a file</a>"#);
            }
            if user.role == Role::Admin {
                links.push_str(r#"<a href="/users/">Users</a>"#);
            }
            links.push_str(r#"<a href="/user/update/">Account</a>"#);
            let _ = write!(
                links,
                r#"<form action="/user/logout" method="POST">{}<button>Logout ({})</button></form>"#,
                ctx.csrf_field(),
                escape(&user.name)
            );
        }
    }
    format!("<nav>{links}</nav>")
}

/// Wrap page content in the shared layout.
pub fn layout(ctx: &PageContext, title: &str, content: &str) -> String {
    let flash = ctx
        .flash
        .as_deref()
        .map(|msg| format!(r#"<div class="flash">{}</div>"#, escape(msg)))
        .unwrap_or_default();

    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title} - Fileshare</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <header><h1><a href=\"/\">Fileshare</a></h1></header>\n{nav}\n<main>\n{flash}\n\
         {content}\n</main>\n</body>\n</html>\n",
        title = escape(title),
        nav = nav(ctx),
    )
}

fn field_error(errors: &FormErrors, field: &str) -> String {
    errors
        .field(field)
        .map(|msg| format!(r#"<div class="error">{}</div>"#, escape(msg)))
        .unwrap_or_default()
}

fn non_field_errors(errors: &FormErrors) -> String {
    errors
        .non_field()
        .iter()
        .map(|msg| format!(r#"<div class="error">{}</div>"#, escape(msg)))
        .collect()
}

fn input(errors: &FormErrors, label: &str, name: &str, kind: &str, value: &str) -> String {
    format!(
        r#"<label>{label}{error}<input type="{kind}" name="{name}" value="{value}"></label>"#,
        label = escape(label),
        error = field_error(errors, name),
        value = escape(value),
    )
}

fn file_table(ctx: &PageContext, files: &[SharedFile]) -> String {
    if files.is_empty() {
        return "<p>There's nothing to see here... yet!</p>".to_string();
    }

    let mut rows = String::new();
    for file in files {
        let _ = write!(
            rows,
            r#"<tr><td><a href="/files/view/{id}">{name}</a></td><td>{sender}</td><td>{recipient}</td><td>{created}</td><td>{expires}</td></tr>"#,
            id = file.id,
            name = escape(&file.doc_name),
            sender = escape(&file.sender_email),
            recipient = escape(&file.recipient_email),
            created = ctx.date(&file.created_at),
            expires = ctx.date(&file.expires_at),
        );
    }
    format!(
        "<table><tr><th>File</th><th>From</th><th>To</th><th>Shared</th><th>Expires</th></tr>{rows}</table>"
    )
}

/// Home page for a signed-in account.
pub fn home_page(ctx: &PageContext, heading: &str, files: &[SharedFile]) -> String {
    let content = format!("<h2>{}</h2>\n{}", escape(heading), file_table(ctx, files));
    layout(ctx, "Home", &content)
}

/// Home page for anonymous visitors.
pub fn landing_page(ctx: &PageContext) -> String {
    let content = "<h2>Share files securely</h2>\n\
        <p>Sign up to send files. Recipients get an account and a password by email.</p>\n\
        <p><a href=\"/user/signup\">Signup</a> or <a href=\"/user/login\">Login</a></p>";
    layout(ctx, "Home", content)
}

/// A single shared file.
pub fn file_view_page(
    ctx: &PageContext,
    file: &SharedFile,
    can_download: bool,
    can_delete: bool,
) -> String {
    let mut actions = String::new();
    if can_download {
        let _ = write!(
            actions,
            r#"<a href="/files/download/{}">Download</a> "#,
            urlencoding::encode(&file.stored_name)
        );
    }
    if can_delete {
        let _ = write!(
            actions,
            r#"<a href="/files/delete/{}?csrf_token={}">Delete</a>"#,
            file.id,
            urlencoding::encode(&ctx.csrf_token)
        );
    }

    let content = format!(
        "<h2>{name}</h2>\n<table>\
         <tr><th>From</th><td>{sender_name} &lt;{sender_email}&gt;</td></tr>\
         <tr><th>To</th><td>{recipient_name} &lt;{recipient_email}&gt;</td></tr>\
         <tr><th>Size</th><td>{size} bytes</td></tr>\
         <tr><th>Shared</th><td>{created}</td></tr>\
         <tr><th>Expires</th><td>{expires}</td></tr>\
         </table>\n<p>{actions}</p>",
        name = escape(&file.doc_name),
        sender_name = escape(&file.sender_name),
        sender_email = escape(&file.sender_email),
        recipient_name = escape(&file.recipient_name),
        recipient_email = escape(&file.recipient_email),
        size = file.size,
        created = ctx.date(&file.created_at),
        expires = ctx.date(&file.expires_at),
    );
    layout(ctx, &file.doc_name, &content)
}

/// Upload form.
pub fn file_create_page(ctx: &PageContext, form: &FileCreateForm, errors: &FormErrors) -> String {
    let content = format!(
        "<h2>Share a file</h2>\n{non_field}\
         <form action=\"/files/create\" method=\"POST\" enctype=\"multipart/form-data\">\n{csrf}\
         <label>File{file_error}<input type=\"file\" name=\"uploadFile\"></label>\
         {doc}{recipient_name}{recipient_email}{sender_name}{sender_email}{expires}\
         <p><button>Share</button></p>\n</form>",
        non_field = non_field_errors(errors),
        csrf = ctx.csrf_field(),
        file_error = field_error(errors, "uploadFile"),
        doc = input(errors, "Display name (optional)", "docName", "text", &form.doc_name),
        recipient_name = input(errors, "Recipient name", "recipientName", "text", &form.recipient_name),
        recipient_email = input(errors, "Recipient email", "recipientEmail", "email", &form.recipient_email),
        sender_name = input(errors, "Your name", "senderName", "text", &form.sender_name),
        sender_email = input(errors, "Your email", "senderEmail", "email", &form.sender_email),
        expires = input(errors, "Expires in (days)", "expires", "number", &form.expires),
    );
    layout(ctx, "Share a file", &content)
}

/// Signup form.
pub fn signup_page(ctx: &PageContext, form: &SignupForm, errors: &FormErrors) -> String {
    let content = format!(
        "<h2>Signup</h2>\n{non_field}<form action=\"/user/signup\" method=\"POST\">\n{csrf}{name}{email}{password}\
         <p><button>Signup</button></p>\n</form>",
        non_field = non_field_errors(errors),
        csrf = ctx.csrf_field(),
        name = input(errors, "Name", "name", "text", &form.name),
        email = input(errors, "Email", "email", "email", &form.email),
        password = input(errors, "Password", "password", "password", ""),
    );
    layout(ctx, "Signup", &content)
}

/// Login form.
pub fn login_page(ctx: &PageContext, form: &LoginForm, errors: &FormErrors) -> String {
    let content = format!(
        "<h2>Login</h2>\n{non_field}<form action=\"/user/login\" method=\"POST\">\n{csrf}{email}{password}\
         <p><button>Login</button></p>\n</form>",
        non_field = non_field_errors(errors),
        csrf = ctx.csrf_field(),
        email = input(errors, "Email", "email", "email", &form.email),
        password = input(errors, "Password", "password", "password", ""),
    );
    layout(ctx, "Login", &content)
}

/// Administrator's user list.
pub fn users_page(ctx: &PageContext, users: &[User]) -> String {
    let mut rows = String::new();
    for user in users {
        let _ = write!(
            rows,
            r#"<tr><td>{id}</td><td>{name}</td><td>{email}</td><td>{role}</td><td>{created}</td><td><a href="/user/edit/{id}">Edit</a> <form action="/user/delete/{id}" method="POST" style="display:inline">{csrf}<button>Delete</button></form></td></tr>"#,
            id = user.id,
            name = escape(&user.name),
            email = escape(&user.email),
            role = user.role.display_name(),
            created = ctx.date(&user.created_at),
            csrf = ctx.csrf_field(),
        );
    }
    let content = format!(
        "<h2>Users</h2>\n<table><tr><th>Id</th><th>Name</th><th>Email</th><th>Role</th><th>Created</th><th></th></tr>{rows}</table>"
    );
    layout(ctx, "Users", &content)
}

fn role_select(errors: &FormErrors, selected: &str) -> String {
    let mut options = String::new();
    for role in Role::ALL {
        let _ = write!(
            options,
            r#"<option value="{value}"{selected}>{label}</option>"#,
            value = role.as_str(),
            selected = if role.as_str() == selected { " selected" } else { "" },
            label = role.display_name(),
        );
    }
    format!(
        r#"<label>Role{}<select name="role">{options}</select></label>"#,
        field_error(errors, "role")
    )
}

/// Administrator's edit form for one account.
pub fn user_edit_page(ctx: &PageContext, id: i64, form: &UserEditForm, errors: &FormErrors) -> String {
    let content = format!(
        "<h2>Edit user</h2>\n{non_field}<form action=\"/user/edit/{id}\" method=\"POST\">\n{csrf}{name}{email}{password}{role}\
         <p><button>Save</button></p>\n</form>",
        non_field = non_field_errors(errors),
        csrf = ctx.csrf_field(),
        name = input(errors, "Name", "name", "text", &form.name),
        email = input(errors, "Email", "email", "email", &form.email),
        password = input(errors, "New password (blank keeps the current one)", "password", "password", ""),
        role = role_select(errors, &form.role),
    );
    layout(ctx, "Edit user", &content)
}

/// Self-service account form.
pub fn account_page(ctx: &PageContext, form: &AccountForm, errors: &FormErrors) -> String {
    let content = format!(
        "<h2>Your account</h2>\n{non_field}<form action=\"/user/update/\" method=\"POST\">\n{csrf}{name}{email}{password}\
         <p><button>Save</button></p>\n</form>",
        non_field = non_field_errors(errors),
        csrf = ctx.csrf_field(),
        name = input(errors, "Name", "name", "text", &form.name),
        email = input(errors, "Email", "email", "email", &form.email),
        password = input(errors, "New password (blank keeps the current one)", "password", "password", ""),
    );
    layout(ctx, "Your account", &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::middleware::CurrentUser;

    fn ctx(principal: Principal) -> PageContext {
        PageContext {
            flash: Some("File successfully uploaded!".to_string()),
            csrf_token: "tok123".to_string(),
            principal,
            timezone: "UTC".to_string(),
        }
    }

    fn signed_in(role: Role) -> Principal {
        Principal::Authenticated(CurrentUser {
            id: 1,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            role,
        })
    }

    fn file() -> SharedFile {
        SharedFile {
            id: 3,
            doc_name: "<script>.pdf".to_string(),
            stored_name: "0b1c2d3e-0000-4000-8000-000000000000.pdf".to_string(),
            size: 10,
            sender_name: "Cheryl Smith".to_string(),
            sender_email: "cheryl@example.com".to_string(),
            recipient_name: "Foo".to_string(),
            recipient_email: "foo@bar.com".to_string(),
            password_hash: "hash".to_string(),
            created_at: "2024-01-01 10:00:00".to_string(),
            expires_at: "2024-12-31 10:00:00".to_string(),
        }
    }

    #[test]
    fn test_layout_shows_flash_and_anonymous_nav() {
        let html = landing_page(&ctx(Principal::Anonymous));
        assert!(html.contains("File successfully uploaded!"));
        assert!(html.contains("/user/signup"));
        assert!(!html.contains("/user/logout"));
    }

    #[test]
    fn test_nav_by_role() {
        let admin = home_page(&ctx(signed_in(Role::Admin)), "Latest files", &[]);
        assert!(admin.contains(r#"href="/users/""#));
        assert!(admin.contains(r#"name="csrf_token" value="tok123""#));

        let guest = home_page(&ctx(signed_in(Role::Guest)), "Files for you", &[]);
        assert!(!guest.contains("/files/create"));
        assert!(!guest.contains(r#"href="/users/""#));
    }

    #[test]
    fn test_file_view_escapes_and_links() {
        let html = file_view_page(&ctx(signed_in(Role::User)), &file(), true, false);
        assert!(html.contains("&lt;script&gt;.pdf"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("cheryl@example.com"));
        assert!(html.contains("/files/download/0b1c2d3e-0000-4000-8000-000000000000.pdf"));
        assert!(!html.contains("/files/delete/"));
    }

    #[test]
    fn test_form_errors_rendered() {
        let mut errors = FormErrors::new();
        errors.add_field("email", "Email address is already in use");
        let html = signup_page(&ctx(Principal::Anonymous), &SignupForm::default(), &errors);
        assert!(html.contains("Email address is already in use"));
    }

    #[test]
    fn test_upload_form_shows_field_errors() {
        let mut form = FileCreateForm::default();
        form.set("recipientEmail", "not-an-email".to_string());
        form.set("expires", "365".to_string());
        let (errors, _) = form.check();

        let html = file_create_page(&ctx(signed_in(Role::User)), &form, &errors);

        assert!(html.contains("This field cannot be blank"));
        assert!(html.contains("This field must be a valid email address"));
        assert!(html.contains(r#"value="not-an-email""#));
    }

    #[test]
    fn test_role_select_marks_current() {
        let form = UserEditForm {
            role: "guest".to_string(),
            ..Default::default()
        };
        let html = user_edit_page(&ctx(signed_in(Role::Admin)), 4, &form, &FormErrors::new());
        assert!(html.contains(r#"<option value="guest" selected>"#));
        assert!(html.contains(r#"action="/user/edit/4""#));
    }
}

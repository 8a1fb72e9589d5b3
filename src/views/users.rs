use maud::{html, Markup};

use crate::{
    db::models::User,
    extractors::PageCtx,
    names,
    oauth::Provider,
    views::components,
};

fn account_type(account_type_id: i64) -> &'static str {
    Provider::from_account_type(account_type_id)
        .map(Provider::label)
        .unwrap_or("Local")
}

pub fn index(ctx: &PageCtx, users: &[User], pageno: i64, total_pages: i64) -> Markup {
    html! {
        h1 { "Users" }

        table {
            thead {
                tr {
                    th {}
                    th { "Username" }
                    th { "Account" }
                    th {}
                }
            }
            tbody {
                @for user in users {
                    tr {
                        td { (components::user_photo(user.photo.as_ref().map(|p| p.media()).as_ref())) }
                        td {
                            a href=(names::user_url(user.id)) { (user.username) }
                            @if user.is_admin { " " mark { "admin" } }
                        }
                        td { (account_type(user.account_type_id)) }
                        td { a href=(names::user_quizzes_url(user.id)) { "Quizzes" } }
                    }
                }
            }
        }

        (components::pagination(names::USERS_URL, pageno, total_pages))

        @if ctx.can_register() {
            a href=(names::NEW_USER_URL) role="button" { "New user" }
        }
    }
}

pub fn show(ctx: &PageCtx, user: &User) -> Markup {
    let can_manage = ctx.user.as_ref().is_some_and(|u| u.can_manage(Some(user.id)));

    html! {
        article {
            header {
                (components::user_photo(user.photo.as_ref().map(|p| p.media()).as_ref()))
                " "
                strong { (user.username) }
                @if user.is_admin { " " mark { "admin" } }
            }

            p { "Account: " (account_type(user.account_type_id)) }
            @if let Some(name) = &user.profile_name {
                p { "Profile name: " (name) }
            }

            @if can_manage {
                p {
                    "API access token: "
                    code { (user.token.as_deref().unwrap_or("-")) }
                }
                form."inline-form" method="post" action=(names::with_method(&names::user_token_url(user.id), "PUT")) {
                    button."secondary" type="submit" { "Create new token" }
                }
            }

            footer {
                a href=(names::user_quizzes_url(user.id)) role="button" class="outline" { "Quizzes" }
                @if can_manage {
                    " "
                    @if user.is_local() {
                        a href=(names::edit_user_url(user.id)) role="button" { "Edit" }
                        " "
                    }
                    form."inline-form" method="post" action=(names::with_method(&names::user_url(user.id), "DELETE")) {
                        button."contrast" type="submit" onclick="return confirm('Delete user?');" { "Delete" }
                    }
                }
            }
        }
    }
}

/// Registration form. `error` is the rejection message of a previous attempt.
pub fn new(username: &str, error: Option<&str>) -> Markup {
    html! {
        h1 { "New user" }

        article style="width: fit-content;" {
            form method="post" action=(names::USERS_URL) enctype="multipart/form-data" {
                (components::field(
                    "Username",
                    html! { input name="username" type="text" value=(username) autocomplete="username"; },
                    error,
                ))
                label {
                    "Password"
                    input name="password" type="password" autocomplete="new-password";
                }
                label {
                    "Photo"
                    input name="photo" type="file" accept="image/*";
                }
                button type="submit" { "Create" }
            }
        }
    }
}

pub fn edit(user: &User) -> Markup {
    html! {
        h1 { "Edit " (user.username) }

        article style="width: fit-content;" {
            form method="post" action=(names::with_method(&names::user_url(user.id), "PUT")) enctype="multipart/form-data" {
                label {
                    "New password"
                    input name="password" type="password" autocomplete="new-password" placeholder="Leave empty to keep it";
                }
                @if let Some(photo) = &user.photo {
                    (components::media(&photo.media()))
                    label {
                        input name="keep_photo" type="checkbox" checked;
                        "Keep current photo"
                    }
                }
                label {
                    "Photo"
                    input name="photo" type="file" accept="image/*";
                }
                button type="submit" { "Save" }
            }
        }
    }
}

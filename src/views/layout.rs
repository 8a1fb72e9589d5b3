use maud::{html, Markup, DOCTYPE};

use crate::{
    extractors::PageCtx,
    names,
    session::{Flash, FlashKind},
    utils,
};

fn css() -> Markup {
    html! {
        link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/@picocss/pico@2/css/pico.min.css";
        link rel="stylesheet" href="/static/index.css";
    }
}

fn js() -> Markup {
    html! {
        script src="/static/js/favourites.js" defer {}
    }
}

fn icon() -> Markup {
    html! {
        link rel="icon" href="/static/img/icon.svg" type="image/svg+xml" {}
    }
}

fn header(ctx: Option<&PageCtx>) -> Markup {
    let user = ctx.and_then(|c| c.user.as_ref());
    html! {
        header {
            nav {
                ul {
                    li."secondary" {
                        a href="/" {
                            strong { "Quizzery" }
                        }
                    }
                    li { a href=(names::QUIZZES_URL) { "Quizzes" } }
                    li { a href=(names::RANDOM_PLAY_URL) { "Random play" } }
                    @if user.is_some() {
                        li { a href=(names::USERS_URL) { "Users" } }
                    }
                    li { a href=(names::AUTHOR_URL) { "Author" } }
                }
                ul {
                    @if let Some(user) = user {
                        li { a href=(names::user_url(user.id)) { (user.username) } }
                        li {
                            form."inline-form" method="post" action=(names::with_method(names::LOGIN_URL, "DELETE")) {
                                button."secondary outline" type="submit" { "Logout" }
                            }
                        }
                    } @else {
                        li { a href=(names::LOGIN_URL) { "Login" } }
                    }
                    li."secondary" { (utils::VERSION) }
                }
            }
        }
    }
}

fn flashes(flashes: &[Flash]) -> Markup {
    html! {
        @if !flashes.is_empty() {
            ul."flashes" {
                @for flash in flashes {
                    @let class = match flash.kind {
                        FlashKind::Success => "flash-success",
                        FlashKind::Info => "flash-info",
                        FlashKind::Error => "flash-error",
                    };
                    li class=(class) { (flash.message) }
                }
            }
        }
    }
}

fn document(title: &str, header: Markup, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        head {
            meta charset="utf-8";
            meta name="viewport" content="width=device-width, initial-scale=1";
            meta name="color-scheme" content="light dark";

            (css())
            (js())
            (icon())

            title { (format!("{title} - Quizzery")) }
        }

        body."container" {
            (header)
            main { (body) }
        }
    }
}

/// A page without request context, used for error pages.
pub fn page(title: &str, body: Markup) -> Markup {
    document(title, header(None), body)
}

/// A full page with the viewer's navigation and pending flash messages.
pub fn render(ctx: &PageCtx, title: &str, body: Markup) -> Markup {
    let pending = ctx.flashes();
    document(
        title,
        header(Some(ctx)),
        html! {
            (flashes(&pending))
            (body)
        },
    )
}

use maud::{html, Markup};

use crate::{extractors::PageCtx, names};

pub fn index(ctx: &PageCtx) -> Markup {
    html! {
        hgroup {
            h1 { "Quizzery" }
            p { "Write trivia questions, collect favourites and see how far a random run takes you." }
        }

        div."grid" {
            a href=(names::QUIZZES_URL) role="button" { "Browse quizzes" }
            a href=(names::RANDOM_PLAY_URL) role="button" class="secondary" { "Random play" }
            @if ctx.user.is_some() {
                a href=(names::NEW_QUIZ_URL) role="button" class="contrast" { "Write a quiz" }
            }
        }
    }
}

pub fn author() -> Markup {
    html! {
        h1 { "Author" }
        article {
            img src="/static/img/icon.svg" alt="Quizzery" width="96";
            p { "Quizzery is a small quiz server written in Rust." }
            p { "Pages are rendered on the server and the same data is available through a token API." }
        }
    }
}

pub fn not_found() -> Markup {
    html! {
        h1 { "404" }
        p { "There is nothing here." }
        a href="/" { "Home" }
    }
}

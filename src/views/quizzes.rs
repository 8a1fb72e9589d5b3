use maud::{html, Markup};

use crate::{
    db::models::Quiz,
    extractors::PageCtx,
    names,
    views::components,
};

/// Query values echoed back into the search form.
pub struct Search<'a> {
    pub text: &'a str,
    pub favourites: bool,
}

pub struct Listing<'a> {
    pub title: &'a str,
    /// Current URL, used to build page links that keep the search.
    pub url: &'a str,
    pub pageno: i64,
    pub total_pages: i64,
}

pub fn index(ctx: &PageCtx, quizzes: &[Quiz], search: Search<'_>, listing: Listing<'_>) -> Markup {
    html! {
        h1 { (listing.title) }

        form method="get" {
            fieldset role="group" {
                input name="search" type="search" value=(search.text) placeholder="Search questions";
                button type="submit" { "Search" }
            }
            @if ctx.user.is_some() {
                label {
                    input name="searchfavourites" type="checkbox" value="true" checked[search.favourites];
                    "Only my favourites"
                }
            }
        }

        table {
            tbody {
                @for quiz in quizzes {
                    tr {
                        td {
                            @if let Some(viewer_id) = ctx.user_id() {
                                (components::favourite_toggle(viewer_id, quiz))
                            }
                        }
                        td {
                            a href=(names::play_quiz_url(quiz.id)) { (quiz.question) }
                        }
                        td { (components::author(quiz.author.as_ref())) }
                        td {
                            @if ctx.user.as_ref().is_some_and(|u| u.can_manage(quiz.author_id())) {
                                a href=(names::quiz_url(quiz.id)) { "Show" }
                                " "
                                a href=(names::edit_quiz_url(quiz.id)) { "Edit" }
                                " "
                                form."inline-form" method="post" action=(names::with_method(&names::quiz_url(quiz.id), "DELETE")) {
                                    button."contrast outline" type="submit" onclick="return confirm('Delete quiz?');" { "Delete" }
                                }
                            }
                        }
                    }
                }
            }
        }

        @if quizzes.is_empty() {
            p { em { "No quizzes found." } }
        }

        (components::pagination(listing.url, listing.pageno, listing.total_pages))

        @if ctx.user.is_some() {
            a href=(names::NEW_QUIZ_URL) role="button" { "New quiz" }
        }
    }
}

pub fn show(quiz: &Quiz) -> Markup {
    html! {
        article {
            header { "Quiz #" (quiz.id) " by " (components::author(quiz.author.as_ref())) }
            @if let Some(attachment) = &quiz.attachment {
                (components::media(&attachment.media()))
            }
            p { strong { "Question: " } (quiz.question) }
            p { strong { "Answer: " } (quiz.answer) }
            footer {
                a href=(names::play_quiz_url(quiz.id)) role="button" { "Play" }
                " "
                a href=(names::edit_quiz_url(quiz.id)) role="button" class="secondary" { "Edit" }
            }
        }
    }
}

/// Values and per-field messages of the quiz form.
#[derive(Default)]
pub struct QuizForm {
    pub question: String,
    pub answer: String,
    pub question_error: Option<&'static str>,
    pub answer_error: Option<&'static str>,
}

impl QuizForm {
    pub fn has_errors(&self) -> bool {
        self.question_error.is_some() || self.answer_error.is_some()
    }
}

fn quiz_fields(form: &QuizForm) -> Markup {
    html! {
        (components::field(
            "Question",
            html! { input name="question" type="text" value=(form.question) aria-invalid=[form.question_error.map(|_| "true")]; },
            form.question_error,
        ))
        (components::field(
            "Answer",
            html! { input name="answer" type="text" value=(form.answer) aria-invalid=[form.answer_error.map(|_| "true")]; },
            form.answer_error,
        ))
    }
}

pub fn new(form: &QuizForm) -> Markup {
    html! {
        h1 { "New quiz" }

        article {
            form method="post" action=(names::QUIZZES_URL) enctype="multipart/form-data" {
                (quiz_fields(form))
                label {
                    "Image or video"
                    input name="image" type="file" accept="image/*,video/*";
                }
                button type="submit" { "Create" }
            }
        }
    }
}

pub fn edit(quiz: &Quiz, form: &QuizForm) -> Markup {
    html! {
        h1 { "Edit quiz #" (quiz.id) }

        article {
            form method="post" action=(names::with_method(&names::quiz_url(quiz.id), "PUT")) enctype="multipart/form-data" {
                (quiz_fields(form))
                @if let Some(attachment) = &quiz.attachment {
                    (components::media(&attachment.media()))
                    label {
                        input name="keep_image" type="checkbox" checked;
                        "Keep current attachment"
                    }
                }
                label {
                    "Image or video"
                    input name="image" type="file" accept="image/*,video/*";
                }
                button type="submit" { "Save" }
            }
        }
    }
}

pub fn play(quiz: &Quiz, answer: &str) -> Markup {
    html! {
        h1 { "Play" }

        article {
            @if let Some(attachment) = &quiz.attachment {
                (components::media(&attachment.media()))
            }
            p { strong { (quiz.question) } }
            form method="get" action=(names::check_quiz_url(quiz.id)) {
                fieldset role="group" {
                    input name="answer" type="text" value=(answer) placeholder="Your answer" autofocus;
                    button type="submit" { "Check" }
                }
            }
        }
    }
}

pub fn check(quiz: &Quiz, answer: &str, result: bool) -> Markup {
    html! {
        h1 { "Result" }

        article {
            p { strong { (quiz.question) } }
            @if result {
                p."flash-success" { "Your answer \"" (answer) "\" is right!" }
            } @else {
                p."flash-error" { "Your answer \"" (answer) "\" is wrong." }
            }
            footer {
                form."inline-form" method="get" action=(names::play_quiz_url(quiz.id)) {
                    input name="answer" type="hidden" value=(answer);
                    button."secondary" type="submit" { "Try again" }
                }
                " "
                a href=(names::QUIZZES_URL) role="button" { "More quizzes" }
            }
        }
    }
}

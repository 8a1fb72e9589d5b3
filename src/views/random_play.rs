use maud::{html, Markup};

use crate::{db::models::Quiz, names, services::random_play::CheckResult, views::components};

fn score(score: usize) -> Markup {
    html! {
        p { "Score: " strong { (score) } }
    }
}

pub fn play(quiz: &Quiz, current_score: usize) -> Markup {
    html! {
        h1 { "Random play" }
        (score(current_score))

        article {
            @if let Some(attachment) = &quiz.attachment {
                (components::media(&attachment.media()))
            }
            p { strong { (quiz.question) } }
            form method="get" action=(names::random_check_url(quiz.id)) {
                fieldset role="group" {
                    input name="answer" type="text" placeholder="Your answer" autofocus;
                    button type="submit" { "Check" }
                }
            }
        }
    }
}

pub fn result(check: &CheckResult) -> Markup {
    html! {
        h1 { "Random play" }

        article {
            @if check.result {
                p."flash-success" { "Your answer \"" (check.answer) "\" is right!" }
                (score(check.score))
                a href=(names::RANDOM_PLAY_URL) role="button" { "Next" }
            } @else {
                p."flash-error" { "Your answer \"" (check.answer) "\" is wrong. The run is over." }
                (score(check.score))
                a href=(names::RANDOM_PLAY_URL) role="button" { "Play again" }
            }
        }
    }
}

pub fn no_more(final_score: usize) -> Markup {
    html! {
        h1 { "Random play" }

        article {
            p { "You answered every quiz. Well done!" }
            (score(final_score))
            a href=(names::RANDOM_PLAY_URL) role="button" { "Play again" }
        }
    }
}

use maud::{html, Markup};

use crate::{
    db::models::{Media, Quiz, UserProfile},
    names, utils,
};

/// Numbered page links. Nothing is rendered for a single page.
pub fn pagination(url: &str, pageno: i64, total_pages: i64) -> Markup {
    html! {
        @if total_pages > 1 {
            nav {
                ul."pagination" {
                    @if pageno > 1 {
                        li { a href=(utils::with_pageno(url, pageno - 1)) { "«" } }
                    }
                    @for n in 1..=total_pages {
                        li {
                            @if n == pageno {
                                strong { (n) }
                            } @else {
                                a href=(utils::with_pageno(url, n)) { (n) }
                            }
                        }
                    }
                    @if pageno < total_pages {
                        li { a href=(utils::with_pageno(url, pageno + 1)) { "»" } }
                    }
                }
            }
        }
    }
}

/// Images render inline, anything else as a video.
pub fn media(media: &Media) -> Markup {
    html! {
        @if media.is_image() {
            img."attachment" src=(media.url) alt=(media.filename);
        } @else {
            video."attachment" src=(media.url) controls {}
        }
    }
}

pub fn user_photo(photo: Option<&Media>) -> Markup {
    html! {
        @match photo {
            Some(photo) if photo.is_image() => {
                img."user-photo" src=(photo.url) alt=(photo.filename);
            }
            _ => {
                img."user-photo" src="/static/img/icon.svg" alt="no photo";
            }
        }
    }
}

pub fn author(author: Option<&UserProfile>) -> Markup {
    html! {
        @match author {
            Some(author) => {
                a href=(names::user_url(author.id)) { (author.username) }
            }
            None => { em { "Anonymous" } }
        }
    }
}

/// Star button. Works as a plain form post or, with script, in place.
pub fn favourite_toggle(viewer_id: i64, quiz: &Quiz) -> Markup {
    let url = names::favourite_url(viewer_id, quiz.id);
    let (action, label, is_fan) = if quiz.favourite {
        (names::with_method(&url, "DELETE"), "★", "true")
    } else {
        (names::with_method(&url, "PUT"), "☆", "false")
    };

    html! {
        form."favourite-toggle inline-form" method="post" action=(action) data-fan=(is_fan) {
            button."outline" .favourite[quiz.favourite] type="submit" title="Favourite" { (label) }
        }
    }
}

/// A form label with an optional validation message below the input.
pub fn field(label: &str, input: Markup, error: Option<&str>) -> Markup {
    html! {
        label {
            (label)
            (input)
            @if let Some(error) = error {
                small."flash-error" { (error) }
            }
        }
    }
}

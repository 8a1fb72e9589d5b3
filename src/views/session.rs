use maud::{html, Markup};

use crate::{extractors::PageCtx, names};

pub fn login(ctx: &PageCtx, username: &str) -> Markup {
    html! {
        h1 { "Login" }

        article style="width: fit-content;" {
            form method="post" action=(names::LOGIN_URL) {
                label {
                    "Username"
                    input name="username" type="text" value=(username) autocomplete="username" required;
                }
                label {
                    "Password"
                    input name="password" type="password" autocomplete="current-password" required;
                }
                button type="submit" { "Login" }
            }

            @if !ctx.oauth_providers.is_empty() {
                hr;
                @for provider in &ctx.oauth_providers {
                    a href=(names::oauth_url(provider.slug())) role="button" class="secondary outline" {
                        "Login with " (provider.label())
                    }
                    " "
                }
            }

            @if ctx.can_register() {
                p {
                    "No account? "
                    a href=(names::NEW_USER_URL) { "Register" }
                }
            }
        }
    }
}

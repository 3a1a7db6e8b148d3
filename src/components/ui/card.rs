use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Card, section, "bg-card text-card-foreground flex flex-col rounded-xl border shadow-sm"}
    clx! {CardHeader, div, "flex items-center gap-3 px-4 py-3 hover:cursor-pointer select-none"}
    clx! {CardTitle, h2, "leading-none font-semibold"}
    clx! {CardContent, div, "flex flex-col gap-2 border-t px-4 py-3"}
    clx! {CardDescription, p, "text-muted-foreground text-sm"}
    clx! {CardList, ul, "flex flex-col divide-y"}
}

pub use components::*;

use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Card, CardContent,
    CardDescription, CardHeader, CardList, CardTitle, Input, Spinner, Textarea,
};
use crate::drafts::{TubeDraft, TubeField};
use crate::state::{AppContext, SaveOutcome};
use icons::{ChevronDown, ChevronRight, Mail, Plus, Trash2, X};
use leptos::ev;
use leptos::html;
use leptos::logging::log;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;
use strum::IntoEnumIterator;
use wasm_bindgen::JsCast;

const ROW_GRID: &str = "grid grid-cols-[2fr_2fr_5rem_2fr_5rem_2rem] items-center gap-2";

fn column_label(field: TubeField) -> &'static str {
    match field {
        TubeField::Name => "Nom",
        TubeField::Esp => "Nom espagnol",
        TubeField::Quantity => "Quantité",
        TubeField::Usage => "Utilisation",
        TubeField::StockMini => "Stock mini",
    }
}

/// Lower bound shown on the numeric inputs of the edit row. Validation still
/// accepts a quantity of 0.
fn edit_min(field: TubeField) -> &'static str {
    match field {
        TubeField::Quantity => "1",
        _ => "0",
    }
}

/// Enter commits the list-title editor (by blurring it).
pub(crate) fn commits_title(key: &str) -> bool {
    key == "Enter"
}

/// A `focusout` on the editing row saves only when focus lands outside the
/// row (or nowhere).
pub(crate) fn focus_leaves_row(row: Option<&web_sys::Node>, next: Option<&web_sys::Node>) -> bool {
    match (row, next) {
        (Some(row), Some(next)) => !row.contains(Some(next)),
        _ => true,
    }
}

/// Does the event target sit inside an element matching `selector`?
fn target_within(ev: &web_sys::MouseEvent, selector: &str) -> bool {
    ev.target()
        .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
        .and_then(|el| el.closest(selector).ok().flatten())
        .is_some()
}

#[component]
pub fn ListsPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let view_state = app_state.0.view;
    let manager = StoredValue::new(app_state.0.manager.clone());

    // Best effort: the save may not finish before the page goes away.
    let _pagehide = window_event_listener(ev::pagehide, move |_ev: web_sys::PageTransitionEvent| {
        let m = manager.get_value();
        if m.has_pending_edit() {
            spawn_local(async move {
                let _ = m.save_on_page_hide().await;
            });
        }
    });

    let on_new_list = move |_| {
        let m = manager.get_value();
        spawn_local(async move {
            let _ = m.create_list().await;
        });
    };

    let on_dismiss_error = move |_| manager.get_value().dismiss_error();

    let loaded = move || view_state.with(|v| v.loaded);
    let list_ids = move || {
        view_state.with(|v| {
            v.lists
                .iter()
                .map(|s| s.list.id.clone())
                .collect::<Vec<_>>()
        })
    };

    view! {
        <div class="min-h-screen bg-background">
            <main class="mx-auto flex w-full max-w-4xl flex-col gap-4 px-4 py-8">
                <header class="flex items-center justify-between">
                    <h1 class="text-lg font-semibold text-foreground">"Stock de tubes"</h1>
                    <Button size=ButtonSize::Sm on:click=on_new_list>
                        <Plus />
                        "Nouvelle liste"
                    </Button>
                </header>

                {move || {
                    view_state.with(|v| v.last_error.clone()).map(|e| {
                        view! {
                            <Alert class="border-destructive/30">
                                <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                                <Button
                                    variant=ButtonVariant::Ghost
                                    size=ButtonSize::Icon
                                    attr:aria-label="Fermer"
                                    on:click=on_dismiss_error
                                >
                                    <X />
                                </Button>
                            </Alert>
                        }
                    })
                }}

                <Show
                    when=loaded
                    fallback=|| view! {
                        <div class="flex items-center gap-2 text-xs text-muted-foreground">
                            <Spinner />
                            "Chargement…"
                        </div>
                    }
                >
                    <Show
                        when=move || !list_ids().is_empty()
                        fallback=|| view! {
                            <p class="text-sm text-muted-foreground">
                                "Aucune liste pour l'instant."
                            </p>
                        }
                    >
                        <div class="flex flex-col gap-3">
                            <For
                                each=list_ids
                                key=|id| id.clone()
                                children=move |id| view! { <ListCard list_id=id /> }
                            />
                        </div>
                    </Show>
                </Show>
            </main>
        </div>
    }
}

#[component]
fn ListCard(list_id: String) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let view_state = app_state.0.view;
    let manager = StoredValue::new(app_state.0.manager.clone());
    let id = StoredValue::new(list_id);

    let snap = Memo::new(move |_| view_state.with(|v| id.with_value(|id| v.list(id).cloned())));
    let expanded = Memo::new(move |_| view_state.with(|v| id.with_value(|id| v.is_expanded(id))));
    let add_open =
        Memo::new(move |_| view_state.with(|v| id.with_value(|id| v.is_add_form_open(id))));

    let name = move || snap.with(|s| s.as_ref().map(|s| s.list.name.clone()).unwrap_or_default());
    let count_label = move || snap.with(|s| s.as_ref().map(|s| s.count_label()).unwrap_or_default());
    let has_mail_action = move || snap.with(|s| s.as_ref().is_some_and(|s| s.mail_action));
    let tube_ids = move || {
        snap.with(|s| {
            s.as_ref()
                .map(|s| s.tubes.iter().map(|t| t.id.clone()).collect::<Vec<_>>())
                .unwrap_or_default()
        })
    };

    let toggle = move || manager.get_value().toggle_expanded(&id.get_value());

    // Header clicks outside the title/editor/buttons toggle the list.
    let on_header_click = move |ev: web_sys::MouseEvent| {
        if !target_within(&ev, "h2, input, button") {
            toggle();
        }
    };

    // Title: single click toggles, double click edits.
    let renaming = RwSignal::new(false);
    let title_value = RwSignal::new(String::new());
    let title_ref: NodeRef<html::Input> = NodeRef::new();

    let on_title_click = move |ev: web_sys::MouseEvent| {
        if ev.detail() <= 1 {
            toggle();
        }
    };
    let on_title_dblclick = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        title_value.set(name());
        renaming.set(true);
    };

    Effect::new(move |_| {
        if renaming.get() {
            if let Some(el) = title_ref.get() {
                let _ = el.focus();
                el.select();
            }
        }
    });

    let on_title_blur = move |_ev: web_sys::FocusEvent| {
        if !renaming.get_untracked() {
            return;
        }
        renaming.set(false);
        let m = manager.get_value();
        let list_id = id.get_value();
        let value = title_value.get_untracked();
        spawn_local(async move {
            let _ = m.rename_list(&list_id, &value).await;
        });
    };
    let on_title_keydown = move |ev: web_sys::KeyboardEvent| {
        if commits_title(&ev.key()) {
            ev.prevent_default();
            if let Some(el) = title_ref.get() {
                let _ = el.blur();
            }
        }
    };

    let on_delete = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        let m = manager.get_value();
        let list_id = id.get_value();
        spawn_local(async move {
            let _ = m.delete_list(&list_id).await;
        });
    };

    let on_mail = move |_| {
        let outcome = manager.get_value().send_order_mail(&id.get_value());
        log!("[tubes] order mail: {outcome:?}");
    };

    let on_toggle_add = move |_| manager.get_value().toggle_add_form(&id.get_value());

    view! {
        <Card attr:data-list-id=id.get_value()>
            <CardHeader on:click=on_header_click>
                <Show
                    when=move || expanded.get()
                    fallback=|| view! { <ChevronRight class="size-4 text-muted-foreground" /> }
                >
                    <ChevronDown class="size-4 text-muted-foreground" />
                </Show>

                <Show
                    when=move || renaming.get()
                    fallback=move || view! {
                        <CardTitle
                            class="flex-1 text-base"
                            on:click=on_title_click
                            on:dblclick=on_title_dblclick
                        >
                            {name}
                        </CardTitle>
                    }
                >
                    <input
                        node_ref=title_ref
                        class="h-8 flex-1 rounded-md border border-input bg-transparent px-2 text-base font-semibold outline-none focus-visible:ring-2 focus-visible:ring-ring/50"
                        prop:value=move || title_value.get()
                        on:input=move |ev: web_sys::Event| title_value.set(event_target_value(&ev))
                        on:keydown=on_title_keydown
                        on:blur=on_title_blur
                    />
                </Show>

                <CardDescription class="text-xs">{count_label}</CardDescription>

                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Icon
                    attr:aria-label="Supprimer la liste"
                    on:click=on_delete
                >
                    <Trash2 />
                </Button>
            </CardHeader>

            <Show when=move || expanded.get() fallback=|| ()>
                <CardContent>
                    <Show when=has_mail_action fallback=|| ()>
                        <Button
                            class="self-end"
                            variant=ButtonVariant::Success
                            size=ButtonSize::Sm
                            on:click=on_mail
                        >
                            <Mail />
                            "Mail Commande"
                        </Button>
                    </Show>

                    <div class=format!("{ROW_GRID} px-1 text-xs text-muted-foreground")>
                        {TubeField::iter().map(|f| view! { <span>{column_label(f)}</span> }).collect_view()}
                        <span></span>
                    </div>

                    <CardList>
                        <For
                            each=tube_ids
                            key=|tid| tid.clone()
                            children=move |tid| view! { <TubeRow tube_id=tid /> }
                        />
                    </CardList>

                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        on:click=on_toggle_add
                    >
                        <Plus />
                        "Ajouter un tube"
                    </Button>

                    <Show when=move || add_open.get() fallback=|| ()>
                        <AddTubeForm list_id=id.get_value() />
                    </Show>
                </CardContent>
            </Show>
        </Card>
    }
}

#[component]
fn TubeRow(tube_id: String) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let view_state = app_state.0.view;
    let id = StoredValue::new(tube_id);

    let is_editing = Memo::new(move |_| {
        view_state.with(|v| id.with_value(|id| v.editing_row(id).is_some()))
    });

    view! {
        <Show
            when=move || is_editing.get()
            fallback=move || view! { <TubeViewRow tube_id=id.get_value() /> }
        >
            <TubeEditRow tube_id=id.get_value() />
        </Show>
    }
}

#[component]
fn TubeViewRow(tube_id: String) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let view_state = app_state.0.view;
    let manager = StoredValue::new(app_state.0.manager.clone());
    let id = StoredValue::new(tube_id);

    let draft = Memo::new(move |_| {
        view_state.with(|v| id.with_value(|id| v.tube(id).map(TubeDraft::from_tube)))
    });

    let begin_edit = move || {
        let m = manager.get_value();
        let tube_id = id.get_value();
        spawn_local(async move {
            m.begin_edit(&tube_id).await;
        });
    };

    let on_delete = move |_| {
        let m = manager.get_value();
        let tube_id = id.get_value();
        spawn_local(async move {
            let _ = m.delete_tube(&tube_id).await;
        });
    };

    let cells = TubeField::iter()
        .map(|field| {
            let value = move || {
                draft.with(|d| d.as_ref().map(|d| d.get(field).to_string()).unwrap_or_default())
            };
            view! {
                <span
                    class=format!("{} min-h-6 truncate rounded px-1 text-sm hover:bg-accent hover:cursor-text", field.as_ref())
                    role="button"
                    on:click=move |_| begin_edit()
                >
                    {value}
                </span>
            }
        })
        .collect_view();

    view! {
        <li class=format!("{ROW_GRID} py-1") data-tube-id=id.get_value()>
            {cells}
            <Button
                variant=ButtonVariant::Ghost
                size=ButtonSize::Icon
                attr:aria-label="Supprimer le tube"
                on:click=on_delete
            >
                <Trash2 />
            </Button>
        </li>
    }
}

#[component]
fn TubeEditRow(tube_id: String) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let view_state = app_state.0.view;
    let manager = StoredValue::new(app_state.0.manager.clone());
    let id = StoredValue::new(tube_id);

    // Mounted once per edit session; the draft is only read here.
    let initial = view_state.with_untracked(|v| {
        id.with_value(|id| v.editing_row(id).map(|r| r.draft.clone()))
    });
    let initial = initial.unwrap_or_default();

    let error = Memo::new(move |_| {
        view_state.with(|v| id.with_value(|id| v.editing_row(id).and_then(|r| r.error.clone())))
    });

    let name_ref: NodeRef<html::Textarea> = NodeRef::new();
    Effect::new(move |_| {
        if let Some(el) = name_ref.get() {
            let _ = el.focus();
        }
    });

    let fields = TubeField::iter()
        .map(|field| {
            let value = RwSignal::new(initial.get(field).to_string());
            Effect::new(move |_| {
                let v = value.get();
                manager
                    .get_value()
                    .set_draft_field(&id.get_value(), field, v);
            });

            let class = field.as_ref();
            match field {
                TubeField::Name => {
                    view! { <Textarea class=class bind_value=value node_ref=name_ref /> }.into_any()
                }
                TubeField::Usage => view! { <Textarea class=class bind_value=value /> }.into_any(),
                TubeField::Esp => view! { <Input class=class bind_value=value /> }.into_any(),
                TubeField::Quantity | TubeField::StockMini => {
                    view! { <Input class=class r#type="number" min=edit_min(field) bind_value=value /> }
                        .into_any()
                }
            }
        })
        .collect_view();

    // Save only when focus leaves the row, not when moving between its fields.
    let on_focusout = move |ev: web_sys::FocusEvent| {
        let row = ev
            .current_target()
            .and_then(|t| t.dyn_into::<web_sys::Node>().ok());
        let next = ev
            .related_target()
            .and_then(|t| t.dyn_into::<web_sys::Node>().ok());
        if !focus_leaves_row(row.as_ref(), next.as_ref()) {
            return;
        }

        let m = manager.get_value();
        spawn_local(async move {
            let _ = m.save_editing().await;
        });
    };

    let on_delete = move |_| {
        let m = manager.get_value();
        let tube_id = id.get_value();
        spawn_local(async move {
            let _ = m.delete_tube(&tube_id).await;
        });
    };

    view! {
        <li class="flex flex-col gap-1 py-1" data-tube-id=id.get_value() on:focusout=on_focusout>
            <div class=ROW_GRID>
                {fields}
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Icon
                    attr:aria-label="Supprimer le tube"
                    on:click=on_delete
                >
                    <Trash2 />
                </Button>
            </div>
            {move || error.get().map(|e| view! { <p class="text-xs text-destructive">{e}</p> })}
        </li>
    }
}

#[component]
fn AddTubeForm(list_id: String) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let manager = StoredValue::new(app_state.0.manager.clone());
    let id = StoredValue::new(list_id);

    let blank = TubeDraft::blank();
    let name = RwSignal::new(blank.name);
    let esp = RwSignal::new(blank.esp);
    let quantity = RwSignal::new(blank.quantity);
    let usage = RwSignal::new(blank.usage);
    let stock_mini = RwSignal::new(blank.stock_mini);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let saving = RwSignal::new(false);

    let reset = move || {
        let blank = TubeDraft::blank();
        name.set(blank.name);
        esp.set(blank.esp);
        quantity.set(blank.quantity);
        usage.set(blank.usage);
        stock_mini.set(blank.stock_mini);
        error.set(None);
    };

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if saving.get_untracked() {
            return;
        }

        let draft = TubeDraft {
            name: name.get_untracked(),
            esp: esp.get_untracked(),
            usage: usage.get_untracked(),
            quantity: quantity.get_untracked(),
            stock_mini: stock_mini.get_untracked(),
        };
        let m = manager.get_value();
        let list_id = id.get_value();

        saving.set(true);
        spawn_local(async move {
            match m.add_tube(&list_id, &draft).await {
                SaveOutcome::Saved => reset(),
                SaveOutcome::Invalid(e) => error.set(Some(e.to_string())),
                SaveOutcome::Failed | SaveOutcome::Skipped => {}
            }
            saving.set(false);
        });
    };

    view! {
        <form class="flex flex-col gap-2 rounded-md border p-3" on:submit=on_submit>
            <div class="grid grid-cols-2 gap-2 sm:grid-cols-5">
                <Input placeholder=column_label(TubeField::Name) bind_value=name required=true />
                <Input placeholder=column_label(TubeField::Esp) bind_value=esp />
                <Input
                    placeholder=column_label(TubeField::Quantity)
                    r#type="number"
                    min="0"
                    bind_value=quantity
                    required=true
                />
                <Input placeholder=column_label(TubeField::Usage) bind_value=usage />
                <Input
                    placeholder=column_label(TubeField::StockMini)
                    r#type="number"
                    min="0"
                    bind_value=stock_mini
                />
            </div>

            {move || error.get().map(|e| view! { <p class="text-xs text-destructive">{e}</p> })}

            <Button class="self-end" size=ButtonSize::Sm attr:disabled=move || saving.get()>
                <Show when=move || saving.get() fallback=|| ()>
                    <Spinner />
                </Show>
                "Ajouter"
            </Button>
        </form>
    }
}

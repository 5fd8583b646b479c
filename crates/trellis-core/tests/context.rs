use trellis_core::{BuildContext, BuildError, State, StatefulWidget, Widget, WidgetBase};
use trellis_testing::{Boxed, Builder, Column, TestTree, Text};

fn ancestor_label() -> Widget {
    Builder::new(|ctx| {
        let boxed = ctx
            .find_ancestor_widget::<Boxed>()
            .map(|boxed| boxed.label.clone());
        let column = ctx.find_ancestor_widget::<Column>().is_some();
        Ok(Text::new(format!("{boxed:?} {column}")).widget())
    })
    .widget()
}

#[test]
fn nearest_ancestor_widget_is_found() {
    let test = TestTree::new();
    let inner = Boxed::new("inner", Some(ancestor_label())).widget();
    test.set_root(Boxed::new("outer", Some(inner)).widget())
        .expect("build");

    assert!(test.find_text("Some(\"inner\") false").is_some());
}

#[test]
fn missing_ancestor_widget_reads_none() {
    let test = TestTree::new();
    test.set_root(ancestor_label()).expect("build");

    assert_eq!(test.root_labels(), vec!["None false"]);
}

struct Holder {
    value: u32,
}

impl WidgetBase for Holder {}

impl StatefulWidget for Holder {
    fn create_state(&self) -> Box<dyn State> {
        Box::new(HolderState { value: 0 })
    }
}

struct HolderState {
    value: u32,
}

impl State for HolderState {
    fn init_state(&mut self, ctx: &BuildContext<'_>) {
        if let Some(holder) = ctx.widget_as::<Holder>() {
            self.value = holder.value;
        }
    }

    fn build(&mut self, _ctx: &BuildContext<'_>) -> Result<Widget, BuildError> {
        Ok(Builder::new(|ctx| {
            let value = ctx.with_ancestor_state(|state: &HolderState| state.value);
            Ok(Text::new(format!("held {value:?}")).widget())
        })
        .widget())
    }
}

#[test]
fn descendants_read_ancestor_state() {
    let test = TestTree::new();
    test.set_root(Widget::stateful(Holder { value: 9 }))
        .expect("build");

    assert_eq!(test.root_labels(), vec!["held Some(9)"]);
}

//! Character counter display.

use std::rc::Rc;

use plume_editor_core::{
    COUNTER_CLASS, ChangeFeed, CharCount, CounterOptions, DocumentPort, EXCEED_CLASS,
    PlatformError, Subscription,
};
use web_sys::{HtmlElement, Node};

use crate::dom;
use crate::reactor::{Reactor, dispatch_weak};

struct CounterHost<P> {
    port: Rc<P>,
    options: CounterOptions,
    element: HtmlElement,
    owned: bool,
}

impl<P: DocumentPort> CounterHost<P> {
    fn render(&self) -> CharCount {
        let count = CharCount::of_document(&*self.port, &self.options);
        self.element.set_text_content(Some(&count.label()));
        dom::toggle_class(&self.element, EXCEED_CLASS, count.exceeded());
        count
    }

    fn destroy(&mut self) {
        if self.owned {
            self.element.remove();
        }
    }
}

/// Live character count of the document.
pub struct CharCounterModule<P>
where
    P: DocumentPort + ChangeFeed + 'static,
{
    host: Rc<Reactor<CounterHost<P>>>,
    subscription: Option<Subscription>,
}

impl<P> CharCounterModule<P>
where
    P: DocumentPort + ChangeFeed + 'static,
{
    /// Render into `container` if given, otherwise into a new element
    /// appended to `parent`. Only a created element is removed on destroy.
    pub fn new(
        port: Rc<P>,
        parent: &Node,
        container: Option<HtmlElement>,
        options: CounterOptions,
    ) -> Result<Self, PlatformError> {
        let (element, owned) = match container {
            Some(element) => {
                dom::toggle_class(&element, COUNTER_CLASS, true);
                (element, false)
            }
            None => {
                let element: HtmlElement =
                    dom::create(&gloo_utils::document(), "div", COUNTER_CLASS)?;
                dom::append(parent, &element)?;
                (element, true)
            }
        };

        let host = Reactor::new(CounterHost {
            port: port.clone(),
            options,
            element,
            owned,
        });
        host.dispatch(|host| {
            host.render();
        });

        let weak = Rc::downgrade(&host);
        let subscription = port.on_content_change(Box::new(move |_source| {
            dispatch_weak(&weak, |host| {
                host.render();
            })
        }));

        Ok(Self {
            host,
            subscription: Some(subscription),
        })
    }

    /// Recount and re-render now.
    pub fn count(&self) -> Option<CharCount> {
        self.host.try_run(|host| host.render())
    }

    /// Unsubscribe and remove the element if this module created it.
    /// Idempotent.
    pub fn destroy(&mut self) {
        if self.subscription.take().is_some() {
            self.host.dispatch(|host| host.destroy());
        }
    }
}

impl<P> Drop for CharCounterModule<P>
where
    P: DocumentPort + ChangeFeed + 'static,
{
    fn drop(&mut self) {
        self.destroy();
    }
}

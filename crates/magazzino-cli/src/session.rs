use anyhow::Result;
use cliclack::input;
use console::style;
use magazzino::client::MagazzinoClient;
use magazzino::orchestrator::chat::ChatOrchestrator;

use crate::view::TerminalView;

/// Interactive chat loop against the knowledge base.
pub struct ChatRepl<'a> {
    orchestrator: ChatOrchestrator<'a>,
    view: TerminalView,
}

impl<'a> ChatRepl<'a> {
    pub fn new(client: &'a MagazzinoClient) -> Self {
        Self {
            orchestrator: ChatOrchestrator::new(client),
            view: TerminalView::new(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        println!(
            "{}",
            style("Magazzino Creatore chat — /ideas for suggestions, /? for help").dim()
        );

        loop {
            let prompt = if self.orchestrator.in_ideas_mode() {
                "Chat (regenerate):"
            } else {
                "Chat:"
            };
            let line: String = input(prompt).placeholder("").interact()?;
            let line = line.trim().to_string();

            match line.as_str() {
                "" => continue,
                "/exit" | "/quit" => break,
                "/ideas" => {
                    self.orchestrator.generate_ideas(&mut self.view).await;
                }
                "/done" => {
                    self.orchestrator.exit_ideas_mode(&mut self.view);
                }
                "/reset" => {
                    self.orchestrator.reset_session();
                    println!("{}", style("Conversation history cleared.").dim());
                }
                "/?" => {
                    println!("Commands:");
                    println!("/ideas - Generate content ideas from your material");
                    println!("/done  - Leave idea-regeneration mode");
                    println!("/reset - Clear the conversation history");
                    println!("/exit  - Quit the session");
                }
                _ => {
                    self.orchestrator.submit(&mut self.view, &line).await;
                }
            }
        }
        Ok(())
    }
}

/// UI pipeline - overlay pass placeholder, records nothing yet

use crate::error::Result;
use crate::graphics_device::CommandList;
use crate::pipelines::{FrameContext, PipelineContext};

pub struct UiPipeline;

impl UiPipeline {
    pub fn new(_ctx: &PipelineContext) -> Result<Self> {
        crate::dbl_debug!("diabolic::ui_pipeline", "UI pipeline created (no overlay content)");
        Ok(Self)
    }

    pub fn populate_command_list(&self, _command_list: &mut dyn CommandList, frame: &FrameContext) -> Result<()> {
        crate::dbl_trace!("diabolic::ui_pipeline", "Frame {}: nothing to draw", frame.frame_index);
        Ok(())
    }
}
